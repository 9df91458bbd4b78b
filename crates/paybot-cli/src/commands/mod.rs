//! CLI command implementations for `paybot`.
//!
//! - [`run`] -- The polling loop (or a single pass with `--once`).
//! - [`parse`] -- Offline parsing of a saved notification.
//! - [`balance`] -- Native balance lookup.
//! - [`config_cmd`] -- Resolved configuration dump.

pub mod balance;
pub mod config_cmd;
pub mod parse;
pub mod run;

use anyhow::Context;
use paybot_platform::Environment;
use paybot_types::config::BotConfig;

/// Resolve the bot configuration from the (already `.env`-merged) environment.
pub fn load_bot_config(env: &dyn Environment) -> anyhow::Result<BotConfig> {
    paybot_platform::load_config(env).context("invalid configuration")
}
