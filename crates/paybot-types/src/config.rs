//! Bot configuration schema.
//!
//! The schema is populated once at startup by the loader in
//! `paybot-platform` and is immutable afterwards. Chain settings are a
//! feature flag by presence: [`BotConfig::chain`] is `None` when no RPC
//! endpoint was configured.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::secret::SecretString;

/// Default IMAP port (implicit TLS).
pub const DEFAULT_IMAP_PORT: u16 = 993;
/// Default folder searched for notifications.
pub const DEFAULT_FOLDER: &str = "INBOX";
/// Default sender filter.
pub const DEFAULT_SENDER_FILTER: &str = "service@paypal.com";
/// Placeholder recipient used when none is configured.
pub const DEFAULT_RECIPIENT: &str = "0x1234567890123456789012345678901234567890";
/// Gas limit of a plain native-token transfer.
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;
/// Seconds between two polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
/// Messages fetched by the dev-mode fallback.
pub const DEFAULT_RECENT_LIMIT: usize = 5;
/// Default log verbosity.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Gas limit of an escrow proof-of-payment call.
pub const DEFAULT_PROOF_GAS_LIMIT: u64 = 100_000;
/// Decimals of the escrow's token unit (a 6-decimal stablecoin).
pub const DEFAULT_PROOF_TOKEN_DECIMALS: u32 = 6;
/// Largest accepted token decimal count.
pub const MAX_PROOF_TOKEN_DECIMALS: u32 = 18;

/// Fully resolved bot configuration.
#[derive(Debug, Clone, Serialize)]
pub struct BotConfig {
    /// Mailbox connection and search settings.
    pub mailbox: MailboxConfig,
    /// Chain settings; `None` disables transfers.
    pub chain: Option<ChainConfig>,
    /// Parameters of every transfer the bot sends.
    pub transfer: TransferConfig,
    /// Escrow reporting of outgoing payments; `None` disables it.
    pub proof: Option<ProofConfig>,
    /// Seconds to sleep between polls.
    pub poll_interval_secs: u64,
    /// Log verbosity (`trace` .. `error`).
    pub log_level: String,
}

impl BotConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Mailbox connection settings.
#[derive(Debug, Clone, Serialize)]
pub struct MailboxConfig {
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port.
    pub port: u16,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: SecretString,
    /// Folder to select before searching.
    pub folder: String,
    /// Only messages from this address are fetched.
    pub sender_filter: String,
    /// Whether the dev-mode fallback fetch is enabled.
    pub fetch_mode: FetchMode,
}

/// How the mailbox client behaves when nothing unseen is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FetchMode {
    /// Only unseen messages are returned. The production setting.
    UnseenOnly,
    /// When nothing is unseen, return the `limit` most recent messages from
    /// the sender without flagging them. Development only: it reprocesses
    /// old notifications on every poll.
    RecentFallback {
        /// How many recent messages to return.
        limit: usize,
    },
}

/// Chain connection settings.
#[derive(Debug, Clone, Serialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Hex-encoded secp256k1 private key of the sending account.
    pub signing_key: SecretString,
    /// Expected chain id; the live value wins on mismatch.
    pub chain_id: Option<u64>,
}

/// Parameters applied to each outgoing transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferConfig {
    /// The single fixed recipient of every transfer.
    pub recipient: String,
    /// Gas limit per transfer.
    pub gas_limit: u64,
    /// Gas price policy.
    pub gas_price: GasPrice,
}

/// Escrow contract that records the payments the account owner sent.
///
/// Every complete "sent" notification becomes one
/// `proofOfPaiement(string name, uint256 amount)` call, with the amount
/// scaled to `token_decimals` and truncated.
#[derive(Debug, Clone, Serialize)]
pub struct ProofConfig {
    /// Contract address, `0x`-prefixed.
    pub contract: String,
    pub gas_limit: u64,
    pub gas_price: GasPrice,
    pub token_decimals: u32,
}

/// Gas price policy for outgoing transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GasPrice {
    /// Ask the endpoint (`eth_gasPrice`) before every transfer.
    #[default]
    Auto,
    /// Fixed price in gwei.
    Gwei(Decimal),
}

impl FromStr for GasPrice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let gwei = Decimal::from_str(trimmed)
            .map_err(|e| format!("expected a gwei amount or \"auto\", got {trimmed:?}: {e}"))?;
        if gwei.is_sign_negative() {
            return Err(format!("gas price must not be negative, got {trimmed}"));
        }
        Ok(Self::Gwei(gwei))
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Gwei(gwei) => write!(f, "{gwei} gwei"),
        }
    }
}

impl Serialize for GasPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_price_parses_auto_case_insensitively() {
        assert_eq!("auto".parse::<GasPrice>().unwrap(), GasPrice::Auto);
        assert_eq!("AUTO".parse::<GasPrice>().unwrap(), GasPrice::Auto);
        assert_eq!("".parse::<GasPrice>().unwrap(), GasPrice::Auto);
    }

    #[test]
    fn gas_price_parses_decimal_gwei() {
        assert_eq!(
            "1.5".parse::<GasPrice>().unwrap(),
            GasPrice::Gwei(Decimal::new(15, 1))
        );
        assert_eq!("5".parse::<GasPrice>().unwrap(), GasPrice::Gwei(Decimal::from(5)));
    }

    #[test]
    fn gas_price_rejects_garbage_and_negatives() {
        assert!("fast".parse::<GasPrice>().is_err());
        assert!("-1".parse::<GasPrice>().is_err());
    }

    #[test]
    fn gas_price_display() {
        assert_eq!(GasPrice::Auto.to_string(), "auto");
        assert_eq!(GasPrice::Gwei(Decimal::from(20)).to_string(), "20 gwei");
    }

    #[test]
    fn config_serializes_without_secrets() {
        let cfg = BotConfig {
            mailbox: MailboxConfig {
                host: "imap.example.com".into(),
                port: DEFAULT_IMAP_PORT,
                username: "bot@example.com".into(),
                password: SecretString::new("mail-secret"),
                folder: DEFAULT_FOLDER.into(),
                sender_filter: DEFAULT_SENDER_FILTER.into(),
                fetch_mode: FetchMode::UnseenOnly,
            },
            chain: Some(ChainConfig {
                rpc_url: "http://localhost:8545".into(),
                signing_key: SecretString::new("0xkey-secret"),
                chain_id: Some(31337),
            }),
            transfer: TransferConfig {
                recipient: DEFAULT_RECIPIENT.into(),
                gas_limit: DEFAULT_GAS_LIMIT,
                gas_price: GasPrice::Auto,
            },
            proof: Some(ProofConfig {
                contract: "0x50222E3513d8e4Ae8EC9B965979994364a10200F".into(),
                gas_limit: DEFAULT_PROOF_GAS_LIMIT,
                gas_price: GasPrice::Gwei(Decimal::from(500)),
                token_decimals: DEFAULT_PROOF_TOKEN_DECIMALS,
            }),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            log_level: DEFAULT_LOG_LEVEL.into(),
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("mail-secret"));
        assert!(!json.contains("0xkey-secret"));
        assert!(json.contains("\"gas_price\":\"auto\""));
        assert!(json.contains("\"mode\":\"unseen_only\""));
        assert!(json.contains("\"token_decimals\":6"));
        assert_eq!(cfg.poll_interval(), Duration::from_secs(60));
    }
}
