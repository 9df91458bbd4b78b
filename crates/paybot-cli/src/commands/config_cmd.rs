//! `paybot config` -- display the resolved configuration.
//!
//! Credentials serialize as a fixed mask, so the output is safe to paste
//! into a bug report.

use anyhow::Context;
use paybot_types::config::BotConfig;

/// Print the resolved configuration as formatted JSON.
pub fn config_show(config: &BotConfig) -> anyhow::Result<()> {
    println!("{}", render(config)?);
    Ok(())
}

fn render(config: &BotConfig) -> anyhow::Result<String> {
    serde_json::to_string_pretty(config).context("failed to serialize config")
}
