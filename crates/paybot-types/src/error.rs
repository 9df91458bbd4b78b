//! Error types for paybot.
//!
//! [`PaybotError`] is the top-level error. [`MailboxError`] and
//! [`ChainError`] cover the two network collaborators; both are
//! non-exhaustive so new failure modes can be added without breaking
//! callers.

use thiserror::Error;

/// Top-level error type.
///
/// Configuration errors are fatal at startup. Mailbox and chain errors are
/// usually caught by the orchestrator, logged, and skipped.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PaybotError {
    /// Configuration is missing or malformed.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A mailbox-layer error bubbled up.
    #[error("mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    /// A chain-layer error bubbled up.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaybotError {
    /// Shorthand for a [`PaybotError::ConfigInvalid`].
    pub fn config(reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            reason: reason.into(),
        }
    }
}

/// Mailbox-specific errors (IMAP session, search, fetch, flag).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MailboxError {
    /// TCP/TLS connection to the mail server failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The server rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// An operation was attempted without a live session.
    #[error("not connected")]
    NotConnected,

    /// Searching or fetching messages failed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Setting the `\Seen` flag failed.
    #[error("flag update failed: {0}")]
    FlagFailed(String),

    /// A fetched message could not be decoded.
    #[error("message decode failed: {0}")]
    Decode(String),
}

/// Chain-specific errors (JSON-RPC, signing, confirmation).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChainError {
    /// The RPC endpoint could not be reached during construction.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP-level failure talking to the endpoint.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },

    /// The endpoint answered with something that is not the expected shape.
    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),

    /// The signing key could not be parsed.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// A recipient or query address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// An amount could not be converted to the chain's smallest unit.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Signing the transaction failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// No receipt was observed before the deadline.
    #[error("no receipt for {tx_hash} after {waited_secs}s")]
    ReceiptTimeout {
        /// Hash of the broadcast transaction.
        tx_hash: String,
        /// How long we waited.
        waited_secs: u64,
    },
}

/// A convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PaybotError>;
