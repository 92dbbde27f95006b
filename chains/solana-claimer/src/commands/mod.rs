//! Subcommand handlers. Each one validates the configuration it needs up
//! front, then drives the batch executor over the loaded wallets.

pub mod check;
pub mod claim;
pub mod drain;

use crate::balance::{self, WalletBalance};
use crate::cli::Command;
use crate::config::{ClaimerConfig, MintSettings, NetworkSettings};
use crate::ledger::{Ledger, RpcLedger};
use crate::wallets::Wallet;
use anyhow::Result;
use colored::Colorize;
use core_logic::BatchExecutor;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared state for one command invocation.
pub struct Runtime {
    pub config: ClaimerConfig,
    pub network: NetworkSettings,
    pub ledger: Arc<dyn Ledger>,
    pub executor: BatchExecutor,
}

impl Runtime {
    /// Validates the settings every subcommand shares. Command-specific
    /// settings are validated by the command itself.
    pub fn new(config: ClaimerConfig, ledger: Arc<dyn Ledger>) -> Result<Self> {
        let network = config.validate_network()?;
        let executor = BatchExecutor::from_config(&config.validate_executor()?);
        Ok(Self {
            config,
            network,
            ledger,
            executor,
        })
    }

    /// Connects to the configured RPC endpoint and stops admitting new
    /// operations on Ctrl+C.
    pub fn connect(config: ClaimerConfig) -> Result<Self> {
        let network = config.validate_network()?;
        let ledger = RpcLedger::new(&network.rpc_url, network.rpc_timeout);
        info!("Using RPC endpoint {}", ledger.url());

        let runtime = Self::new(config, Arc::new(ledger))?;
        runtime.executor.cancel_on_ctrl_c();
        Ok(runtime)
    }

    /// Balance snapshot of every wallet, in wallet order.
    pub async fn inspect_all(
        &self,
        wallets: &[Wallet],
        mints: &MintSettings,
    ) -> Result<Vec<WalletBalance>> {
        let progress = counter(
            format!("retrieving {} account balances...", wallets.len()),
            wallets.len(),
        );

        let ledger = self.ledger.as_ref();
        let base_mint = &mints.base_mint;
        let quote_mint = &mints.quote_mint;
        let progress_ref = &progress;

        let ops: Vec<_> = wallets
            .iter()
            .map(|wallet| {
                move || async move {
                    let balance =
                        balance::inspect(ledger, wallet.pubkey(), base_mint, quote_mint).await?;
                    progress_ref.inc(1);
                    Ok::<_, anyhow::Error>(WalletBalance {
                        wallet: wallet.clone(),
                        balance,
                    })
                }
            })
            .collect();

        let result = self.executor.run(ops).await;
        progress.finish_and_clear();
        Ok(result?)
    }
}

pub async fn dispatch(command: Command, config: ClaimerConfig) -> Result<()> {
    match command {
        Command::Check { execute } => check::run(&Runtime::connect(config)?, execute).await,
        Command::Claim { execute } => claim::run(&Runtime::connect(config)?, execute).await,
        Command::Drain(args) => drain::run(&Runtime::connect(config)?, &args).await,
    }
}

pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    styled(ProgressBar::new_spinner(), "{spinner:.cyan} {msg}", message)
}

/// Spinner with a `done/total` counter.
pub(crate) fn counter(message: impl Into<String>, total: usize) -> ProgressBar {
    styled(
        ProgressBar::new(total as u64),
        "{spinner:.cyan} {msg} {pos}/{len}",
        message,
    )
}

fn styled(progress: ProgressBar, template: &str, message: impl Into<String>) -> ProgressBar {
    let style =
        ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner());
    progress.set_style(style);
    progress.set_message(message.into());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

pub(crate) fn heading(title: &str) {
    println!("\n{}", title.white().bold());
}
