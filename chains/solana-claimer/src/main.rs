use anyhow::Result;
use clap::Parser;
use core_logic::setup_logger;
use dotenv::dotenv;
use solana_claimer::cli::Cli;
use solana_claimer::commands;
use solana_claimer::config::ClaimerConfig;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Cli::parse();

    let console_level = if args.verbose { Level::DEBUG } else { Level::ERROR };
    let _log_guard = setup_logger(console_level);

    info!("Loading config from: {}", args.config);
    let config = ClaimerConfig::load(&args.config)?;

    if let Err(e) = commands::dispatch(args.command, config).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
