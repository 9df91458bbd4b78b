//! Configuration loading from the environment.
//!
//! Two steps, both run before any network I/O:
//!
//! 1. [`load_env_file`] merges a `.env` file into the process environment
//!    (`PAYBOT_ENV_FILE` if set, otherwise `./.env` in the working
//!    directory). Variables already set are not overridden.
//! 2. [`load_config`] reads the flat variables, applies defaults and
//!    validates them into a [`BotConfig`].
//!
//! Variable names are the operator-facing names the bot has always used
//! (`IMAP_SERVER`, `EVM_RPC_URL`, `GAS_PRICE_GWEI`, ...).

use std::path::PathBuf;
use std::str::FromStr;

use paybot_types::config::{
    BotConfig, ChainConfig, DEFAULT_FOLDER, DEFAULT_GAS_LIMIT, DEFAULT_IMAP_PORT,
    DEFAULT_LOG_LEVEL, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PROOF_GAS_LIMIT,
    DEFAULT_PROOF_TOKEN_DECIMALS, DEFAULT_RECENT_LIMIT, DEFAULT_RECIPIENT, DEFAULT_SENDER_FILTER,
    FetchMode, GasPrice, MAX_PROOF_TOKEN_DECIMALS, MailboxConfig, ProofConfig, TransferConfig,
};
use paybot_types::{PaybotError, Result, SecretString};

use crate::env::Environment;

/// Explicit path of the `.env` file.
pub const ENV_FILE_VAR: &str = "PAYBOT_ENV_FILE";

/// Merge a `.env` file into the process environment.
///
/// Returns the path that was loaded, or `None` when there is no `./.env`.
/// An explicit `PAYBOT_ENV_FILE` that cannot be read is an error.
pub fn load_env_file(env: &dyn Environment) -> Result<Option<PathBuf>> {
    if let Some(explicit) = non_empty(env, ENV_FILE_VAR) {
        let path = PathBuf::from(explicit);
        dotenvy::from_path(&path).map_err(|e| {
            PaybotError::config(format!("cannot load env file {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded env file");
        return Ok(Some(path));
    }

    let path = PathBuf::from(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded env file");
            Ok(Some(path))
        }
        Err(e) if e.not_found() => {
            tracing::debug!("no .env file found, using process environment only");
            Ok(None)
        }
        Err(e) => Err(PaybotError::config(format!("cannot load .env file: {e}"))),
    }
}

/// Build the bot configuration from environment variables.
pub fn load_config(env: &dyn Environment) -> Result<BotConfig> {
    let host = non_empty(env, "IMAP_SERVER");
    let username = non_empty(env, "IMAP_USERNAME");
    let password = non_empty(env, "IMAP_PASSWORD");
    let (Some(host), Some(username), Some(password)) = (host, username, password) else {
        return Err(PaybotError::config(
            "IMAP_SERVER, IMAP_USERNAME, and IMAP_PASSWORD must be set",
        ));
    };

    let fetch_mode = if parse_bool(env, "DEV_RECENT_FALLBACK", false)? {
        FetchMode::RecentFallback {
            limit: parse_number(env, "DEV_RECENT_LIMIT", DEFAULT_RECENT_LIMIT)?,
        }
    } else {
        FetchMode::UnseenOnly
    };

    let mailbox = MailboxConfig {
        host,
        port: parse_number(env, "IMAP_PORT", DEFAULT_IMAP_PORT)?,
        username,
        password: SecretString::new(password),
        folder: non_empty(env, "IMAP_FOLDER").unwrap_or_else(|| DEFAULT_FOLDER.into()),
        sender_filter: non_empty(env, "PAYPAL_SENDER_EMAIL")
            .unwrap_or_else(|| DEFAULT_SENDER_FILTER.into()),
        fetch_mode,
    };

    // Parsed even when chain features are off so a typo fails at startup.
    let chain_id = match non_empty(env, "CHAIN_ID") {
        Some(raw) => Some(
            raw.parse::<u64>()
                .map_err(|_| PaybotError::config("CHAIN_ID must be an integer if provided"))?,
        ),
        None => None,
    };
    let gas_limit = parse_number(env, "GAS_LIMIT", DEFAULT_GAS_LIMIT)
        .map_err(|_| PaybotError::config("GAS_LIMIT must be an integer"))?;
    let gas_price = match non_empty(env, "GAS_PRICE_GWEI") {
        Some(raw) => GasPrice::from_str(&raw)
            .map_err(|e| PaybotError::config(format!("GAS_PRICE_GWEI: {e}")))?,
        None => GasPrice::Auto,
    };

    let rpc_url = non_empty(env, "EVM_RPC_URL");
    let signing_key = non_empty(env, "SENDER_PRIVATE_KEY");
    let chain = match (rpc_url, signing_key) {
        (Some(rpc_url), Some(key)) => Some(ChainConfig {
            rpc_url,
            signing_key: SecretString::new(key),
            chain_id,
        }),
        (Some(_), None) => {
            return Err(PaybotError::config(
                "SENDER_PRIVATE_KEY must be set if EVM_RPC_URL is provided",
            ));
        }
        (None, Some(_)) => {
            tracing::warn!("SENDER_PRIVATE_KEY is set without EVM_RPC_URL; chain features disabled");
            None
        }
        (None, None) => None,
    };

    let proof = match non_empty(env, "ESCROW_CONTRACT_ADDRESS") {
        Some(contract) => {
            if !is_hex_address(&contract) {
                return Err(PaybotError::config(format!(
                    "ESCROW_CONTRACT_ADDRESS must be a 0x-prefixed 20-byte hex address, got {contract:?}"
                )));
            }
            let token_decimals =
                parse_number(env, "PROOF_TOKEN_DECIMALS", DEFAULT_PROOF_TOKEN_DECIMALS)?;
            if token_decimals > MAX_PROOF_TOKEN_DECIMALS {
                return Err(PaybotError::config(format!(
                    "PROOF_TOKEN_DECIMALS must be at most {MAX_PROOF_TOKEN_DECIMALS}, got {token_decimals}"
                )));
            }
            let gas_price = match non_empty(env, "PROOF_GAS_PRICE_GWEI") {
                Some(raw) => GasPrice::from_str(&raw)
                    .map_err(|e| PaybotError::config(format!("PROOF_GAS_PRICE_GWEI: {e}")))?,
                None => gas_price,
            };
            let proof = ProofConfig {
                contract,
                gas_limit: parse_number(env, "PROOF_GAS_LIMIT", DEFAULT_PROOF_GAS_LIMIT)?,
                gas_price,
                token_decimals,
            };
            if chain.is_none() {
                tracing::warn!(
                    "ESCROW_CONTRACT_ADDRESS is set without chain settings; proof reporting disabled"
                );
                None
            } else {
                Some(proof)
            }
        }
        None => None,
    };

    let log_level = match non_empty(env, "LOG_LEVEL") {
        Some(raw) => normalize_log_level(&raw)?,
        None => DEFAULT_LOG_LEVEL,
    };

    let recipient = non_empty(env, "RECIPIENT_ADDRESS")
        .or_else(|| non_empty(env, "MOCKUP_RECIPIENT_ADDRESS"))
        .unwrap_or_else(|| DEFAULT_RECIPIENT.into());

    Ok(BotConfig {
        mailbox,
        chain,
        transfer: TransferConfig {
            recipient,
            gas_limit,
            gas_price,
        },
        proof,
        poll_interval_secs: parse_number(env, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?,
        log_level: log_level.to_string(),
    })
}

/// Map a `LOG_LEVEL` value to a tracing level name.
///
/// Case-insensitive. `warning` is an alias of `warn`, `critical` and
/// `fatal` of `error`. Anything else is a configuration error.
pub fn normalize_log_level(raw: &str) -> Result<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "critical" | "fatal" => Ok("error"),
        _ => Err(PaybotError::config(format!(
            "LOG_LEVEL must be one of trace, debug, info, warn, error, got {raw:?}"
        ))),
    }
}

fn is_hex_address(raw: &str) -> bool {
    raw.strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Trimmed value of `name`; unset and blank are both `None`.
fn non_empty(env: &dyn Environment, name: &str) -> Option<String> {
    env.get_var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(env: &dyn Environment, name: &str, default: T) -> Result<T> {
    match non_empty(env, name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| PaybotError::config(format!("{name} must be an integer, got {raw:?}"))),
        None => Ok(default),
    }
}

fn parse_bool(env: &dyn Environment, name: &str, default: bool) -> Result<bool> {
    let Some(raw) = non_empty(env, name) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PaybotError::config(format!(
            "{name} must be a boolean, got {raw:?}"
        ))),
    }
}
