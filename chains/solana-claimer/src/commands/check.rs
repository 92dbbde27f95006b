use super::{counter, heading, Runtime};
use crate::eligibility::{EligibilityRecord, EligibilitySummary, ProofClient};
use crate::wallets::load_wallets;
use anyhow::Result;
use solana_sdk::pubkey::Pubkey;
use tracing::info;

pub async fn run(runtime: &Runtime, execute: bool) -> Result<()> {
    let distribution = runtime.config.validate_distribution()?;
    let mints = runtime.config.validate_mints()?;
    let proofs = ProofClient::new(
        &distribution.proof_endpoint,
        distribution.token_mint,
        distribution.proof_retries,
    )?;

    let wallets = load_wallets(&runtime.config.keys_dir)?;
    info!("Loaded {} wallets from {}", wallets.len(), runtime.config.keys_dir);

    let holdings = runtime.inspect_all(&wallets, &mints).await?;

    let progress = counter(format!("checking {} wallets...", holdings.len()), holdings.len());
    let owners: Vec<Pubkey> = holdings.iter().map(|h| h.wallet.pubkey()).collect();
    let records = check_all(runtime, &proofs, owners, || progress.inc(1)).await;
    progress.finish_and_clear();
    let records = records?;

    let summary = EligibilitySummary::from_records(&records, distribution.token_decimals);
    print_summary(&summary);

    // An empty list is saved too, so `claim` never reads a previous run's list.
    if execute {
        let path = runtime.config.save_drop_wallets(&summary.drop_wallets)?;
        info!(
            target: "task_result",
            "SUCCESS saved {} drop wallets to {}",
            summary.drop_wallets.len(),
            path.display()
        );
    }

    Ok(())
}

/// Eligibility lookups for `owners`, in order. Lookups never fail; only
/// cancellation or an operation timeout ends the batch early.
pub async fn check_all(
    runtime: &Runtime,
    proofs: &ProofClient,
    owners: Vec<Pubkey>,
    on_done: impl Fn(),
) -> Result<Vec<EligibilityRecord>> {
    let on_done = &on_done;
    let ops: Vec<_> = owners
        .into_iter()
        .map(|owner| {
            move || async move {
                let record = proofs.fetch(owner).await;
                on_done();
                Ok::<_, anyhow::Error>(record)
            }
        })
        .collect();

    Ok(runtime.executor.run(ops).await?)
}

fn print_summary(summary: &EligibilitySummary) {
    heading("TOTAL");
    println!("{}", summary.total);

    if summary.unavailable > 0 {
        println!(
            "{} wallets could not be checked; their eligibility is unknown",
            summary.unavailable
        );
    }

    heading("DROP_WALLETS");
    for wallet in &summary.drop_wallets {
        println!("{}", wallet);
    }
}
