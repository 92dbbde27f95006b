use super::{heading, spinner, Runtime};
use crate::balance::{DrainAsset, WalletBalance};
use crate::cli::DrainArgs;
use crate::drain::{total_drainable, total_drainable_sol, Drainer, TransferOutcome};
use crate::wallets::load_wallets;
use anyhow::{bail, Result};
use colored::Colorize;
use solana_sdk::pubkey::Pubkey;
use tracing::info;

pub async fn run(runtime: &Runtime, args: &DrainArgs) -> Result<()> {
    if !args.any() {
        bail!("Nothing to drain: pass --base, --quote, --tokens or --sol");
    }

    let mints = runtime.config.validate_mints()?;
    // Resolve every destination before touching the ledger.
    let base_destination = args
        .drain_base()
        .then(|| runtime.config.base_destination())
        .transpose()?;
    let quote_destination = args
        .drain_quote()
        .then(|| runtime.config.quote_destination())
        .transpose()?;
    let sol_destination = args
        .sol
        .then(|| runtime.config.sol_destination())
        .transpose()?;

    let wallets = load_wallets(&runtime.config.keys_dir)?;
    info!("Loaded {} wallets from {}", wallets.len(), runtime.config.keys_dir);

    let holdings = runtime.inspect_all(&wallets, &mints).await?;
    print_accounts(&holdings);

    let drainer = Drainer::new(runtime.ledger.clone(), runtime.executor.clone());

    if let Some(destination) = base_destination {
        drain_asset(&drainer, &holdings, DrainAsset::Base, destination).await?;
    }
    if let Some(destination) = quote_destination {
        drain_asset(&drainer, &holdings, DrainAsset::Quote, destination).await?;
    }
    if let Some(destination) = sol_destination {
        let reserve = runtime.config.drain.sol_fee_reserve;
        heading("SOL SIZE");
        println!("{}", total_drainable_sol(&holdings, reserve));

        let progress = spinner(format!("draining {} sol wallets...", holdings.len()));
        let outcomes = drainer.drain_sol(&holdings, destination, reserve).await;
        progress.finish_and_clear();

        heading("SOL DRAINED");
        print_outcomes(&outcomes?);
    }

    Ok(())
}

async fn drain_asset(
    drainer: &Drainer,
    holdings: &[WalletBalance],
    asset: DrainAsset,
    destination: Pubkey,
) -> Result<()> {
    heading(&format!("{} SIZE", asset));
    println!("{}", total_drainable(holdings, asset));

    let progress = spinner(format!(
        "draining {} {} wallets...",
        holdings.len(),
        asset.to_string().to_lowercase()
    ));
    let outcomes = drainer.drain_tokens(holdings, asset, destination).await;
    progress.finish_and_clear();

    heading(&format!("{} DRAINED", asset));
    print_outcomes(&outcomes?);
    Ok(())
}

fn print_accounts(holdings: &[WalletBalance]) {
    heading("ACCOUNTS");
    for holding in holdings {
        let balance = &holding.balance;
        println!(
            "{} {} {} {}",
            holding.wallet.address(),
            balance.sol(),
            balance.quote.ui_amount,
            balance.base.ui_amount
        );
    }
}

fn print_outcomes(outcomes: &[TransferOutcome]) {
    for outcome in outcomes {
        match outcome {
            TransferOutcome::Sent { .. } => println!("{}", outcome.to_string().green()),
            TransferOutcome::Failed { .. } => println!("{}", outcome.to_string().red()),
            TransferOutcome::Skipped { .. } => println!("{}", outcome.to_string().dimmed()),
        }
    }
}
