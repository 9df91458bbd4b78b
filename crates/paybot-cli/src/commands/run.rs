//! `paybot run` -- the polling loop.
//!
//! The mailbox must connect or the command fails. A chain endpoint that
//! cannot be reached only disables transfers and escrow reporting for this
//! run; notifications are still fetched, parsed and logged.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use paybot_chain::{ChainClient, NativeTransfer, PaymentProof};
use paybot_core::{BotSettings, PaymentBot};
use paybot_mail::{ImapMailbox, Mailbox};
use paybot_platform::Environment;
use paybot_types::config::{ChainConfig, FetchMode};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::load_bot_config;

/// Arguments for the `run` subcommand.
#[derive(Args)]
pub struct RunArgs {
    /// Run a single poll, print its report as JSON, and exit.
    #[arg(long)]
    pub once: bool,
}

pub async fn run(args: RunArgs, env: &dyn Environment) -> anyhow::Result<()> {
    let config = load_bot_config(env)?;

    if let FetchMode::RecentFallback { limit } = config.mailbox.fetch_mode {
        warn!(
            limit,
            "dev fallback enabled: recent messages are reprocessed when nothing is unseen"
        );
    }

    let mailbox = Arc::new(ImapMailbox::new(config.mailbox.clone()));
    mailbox
        .connect()
        .await
        .with_context(|| format!("cannot open mailbox on {}", config.mailbox.host))?;

    let chain = match &config.chain {
        Some(chain) => connect_chain(chain).await,
        None => {
            info!("no EVM_RPC_URL configured, transfers disabled");
            None
        }
    };

    let transfer = chain.clone().map(|client| client as Arc<dyn NativeTransfer>);
    let mut bot = PaymentBot::new(mailbox.clone(), transfer, BotSettings::from_config(&config));
    if let Some(proof) = &config.proof {
        match chain {
            Some(client) => {
                info!(contract = %proof.contract, "escrow reporting enabled");
                let escrow: Arc<dyn PaymentProof> = client;
                bot = bot.with_escrow(escrow);
            }
            None => warn!(contract = %proof.contract, "chain unavailable, escrow reporting disabled"),
        }
    }

    if args.once {
        let report = bot.poll_once().await;
        mailbox.logout().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received shutdown signal");
                signal_cancel.cancel();
            }
            Err(e) => warn!(error = %e, "cannot listen for ctrl-c"),
        }
    });

    bot.run(cancel).await;
    Ok(())
}

async fn connect_chain(chain: &ChainConfig) -> Option<Arc<ChainClient>> {
    match ChainClient::connect(&chain.rpc_url, &chain.signing_key, chain.chain_id).await {
        Ok(client) => {
            info!(
                address = %client.address(),
                chain_id = client.chain_id(),
                "chain client ready"
            );
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!(error = %e, rpc_url = %chain.rpc_url, "chain unavailable, transfers disabled");
            None
        }
    }
}
