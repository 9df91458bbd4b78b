//! `paybot balance` -- native balance on the configured chain.

use std::str::FromStr;

use anyhow::Context;
use clap::Args;
use paybot_chain::{Address, ChainClient};
use paybot_platform::Environment;

use super::load_bot_config;

/// Arguments for the `balance` subcommand.
#[derive(Args)]
pub struct BalanceArgs {
    /// Address to query; defaults to the signing account.
    #[arg(long)]
    pub address: Option<String>,
}

/// Connect to the configured endpoint and print one balance.
pub async fn run(args: BalanceArgs, env: &dyn Environment) -> anyhow::Result<()> {
    let config = load_bot_config(env)?;
    let chain = config
        .chain
        .context("chain features are disabled: set EVM_RPC_URL and SENDER_PRIVATE_KEY")?;

    let address = args
        .address
        .as_deref()
        .map(|raw| Address::from_str(raw.trim()).with_context(|| format!("invalid address {raw}")))
        .transpose()?;

    let client = ChainClient::connect(&chain.rpc_url, &chain.signing_key, chain.chain_id).await?;
    let balance = client.get_balance(address).await?;

    let shown = address.unwrap_or_else(|| client.address());
    println!("{shown} {balance} (chain {})", client.chain_id());
    Ok(())
}
