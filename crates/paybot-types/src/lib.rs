//! # paybot-types
//!
//! Core type definitions shared by every paybot crate.
//!
//! - **[`error`]** -- [`PaybotError`], [`MailboxError`] and [`ChainError`]
//! - **[`config`]** -- Bot configuration schema (mailbox, chain, transfer)
//! - **[`mail`]** -- Messages as handed over by the mailbox client
//! - **[`payment`]** -- Parsed payment notifications and transfer receipts
//! - **[`secret`]** -- [`SecretString`] for passwords and signing keys

pub mod config;
pub mod error;
pub mod mail;
pub mod payment;
pub mod secret;

pub use error::{ChainError, MailboxError, PaybotError, Result};
pub use secret::SecretString;
