//! `paybot` -- payment-notification to EVM transfer bot.
//!
//! Provides the following subcommands:
//!
//! - `paybot run` -- Poll the mailbox and send transfers until interrupted.
//! - `paybot parse` -- Parse a saved notification offline.
//! - `paybot balance` -- Show the native balance of the signer (or any address).
//! - `paybot config` -- Show the resolved configuration with secrets masked.

use clap::Parser;
use paybot_platform::{Environment, NativeEnvironment, load_env_file, normalize_log_level};
use paybot_types::config::DEFAULT_LOG_LEVEL;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

/// Payment-notification to EVM transfer bot.
#[derive(Parser)]
#[command(name = "paybot", about = "Payment-notification to EVM transfer bot", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Poll the mailbox and send transfers until interrupted.
    Run(commands::run::RunArgs),

    /// Parse a saved notification (.eml, or HTML with --subject) and print it.
    Parse(commands::parse::ParseArgs),

    /// Show a native balance on the configured chain.
    Balance(commands::balance::BalanceArgs),

    /// Show the resolved configuration (secrets masked).
    Config,
}

/// Filter used when `RUST_LOG` is unset: `--verbose`, else `LOG_LEVEL`.
///
/// An unknown `LOG_LEVEL` is an error even with `--verbose`, so a typo can
/// never silence the bot's own targets.
fn fallback_filter(
    verbose: bool,
    env: &dyn Environment,
) -> paybot_types::Result<&'static str> {
    let level = match env.get_var("LOG_LEVEL") {
        Some(raw) if !raw.trim().is_empty() => normalize_log_level(&raw)?,
        _ => DEFAULT_LOG_LEVEL,
    };
    Ok(if verbose { "debug" } else { level })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env = NativeEnvironment;

    // Before the subscriber, so LOG_LEVEL from .env takes effect.
    let env_file = load_env_file(&env);

    let fallback = fallback_filter(cli.verbose, &env)?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(fallback))
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .init();

    if let Some(path) = env_file? {
        debug!(path = %path.display(), "environment file loaded");
    }

    match cli.command {
        Commands::Run(args) => commands::run::run(args, &env).await?,
        Commands::Parse(args) => commands::parse::run(args)?,
        Commands::Balance(args) => commands::balance::run(args, &env).await?,
        Commands::Config => {
            let config = commands::load_bot_config(&env)?;
            commands::config_cmd::config_show(&config)?;
        }
    }

    Ok(())
}
