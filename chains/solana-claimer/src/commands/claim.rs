use super::{heading, Runtime};
use crate::claim::{ClaimOutcome, Claimer};
use crate::eligibility::ProofClient;
use crate::wallets::load_wallets;
use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

pub async fn run(runtime: &Runtime, execute: bool) -> Result<()> {
    let distribution = runtime.config.validate_distribution()?;
    let allow_list = runtime.config.drop_wallets()?;

    let wallets = load_wallets(&runtime.config.keys_dir)?;
    info!(
        "Claiming for {} drop wallets ({} keys loaded, execute: {})",
        allow_list.len(),
        wallets.len(),
        execute
    );

    let proofs = Arc::new(ProofClient::new(
        &distribution.proof_endpoint,
        distribution.token_mint,
        distribution.proof_retries,
    )?);
    let claimer = Claimer::new(runtime.ledger.clone(), proofs, distribution, execute);

    let outcomes = claimer
        .claim_all(&runtime.executor, &wallets, &allow_list)
        .await?;

    heading("CLAIMS");
    for outcome in &outcomes {
        match outcome {
            ClaimOutcome::Failed { .. } => println!("{}", outcome.to_string().red()),
            _ => println!("{}", outcome),
        }
    }

    heading("DONE");
    Ok(())
}
