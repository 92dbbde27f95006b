use crate::balance::{DrainAsset, WalletBalance};
use crate::ledger::Ledger;
use crate::wallets::Wallet;
use anyhow::Result;
use core_logic::BatchExecutor;
use solana_sdk::instruction::Instruction;
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Nothing to move; no transaction was built.
    Skipped { wallet: Pubkey },
    Sent { wallet: Pubkey, amount: u64, signature: Signature },
    Failed { wallet: Pubkey, reason: String },
}

impl TransferOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, TransferOutcome::Sent { .. })
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOutcome::Skipped { wallet } => write!(f, "{} skipped (nothing to drain)", wallet),
            TransferOutcome::Sent {
                wallet,
                amount,
                signature,
            } => write!(f, "{} SUCCESS {} {}", wallet, amount, signature),
            TransferOutcome::Failed { wallet, reason } => write!(f, "{} FAILED {}", wallet, reason),
        }
    }
}

/// Sum of the decimal-adjusted `asset` balance over all wallets.
pub fn total_drainable(holdings: &[WalletBalance], asset: DrainAsset) -> f64 {
    holdings
        .iter()
        .map(|h| h.balance.asset(asset).ui_amount)
        .sum()
}

/// Sum of native balances above `reserve`, in SOL.
pub fn total_drainable_sol(holdings: &[WalletBalance], reserve: u64) -> f64 {
    let lamports = holdings
        .iter()
        .map(|h| h.balance.native.saturating_sub(reserve))
        .sum::<u64>();
    lamports_to_sol(lamports)
}

pub struct Drainer {
    ledger: Arc<dyn Ledger>,
    executor: BatchExecutor,
}

impl Drainer {
    pub fn new(ledger: Arc<dyn Ledger>, executor: BatchExecutor) -> Self {
        Self { ledger, executor }
    }

    /// Moves each wallet's whole `asset` balance to `destination`, a token
    /// account for the same mint. Wallets holding none are skipped.
    pub async fn drain_tokens(
        &self,
        holdings: &[WalletBalance],
        asset: DrainAsset,
        destination: Pubkey,
    ) -> Result<Vec<TransferOutcome>> {
        let ops: Vec<_> = holdings
            .iter()
            .map(|holding| {
                move || async move {
                    let balance = holding.balance.asset(asset);
                    let wallet = &holding.wallet;
                    if balance.raw == 0 {
                        return Ok::<_, anyhow::Error>(TransferOutcome::Skipped {
                            wallet: wallet.pubkey(),
                        });
                    }

                    let instruction = match spl_token::instruction::transfer(
                        &spl_token::id(),
                        &balance.account,
                        &destination,
                        &wallet.pubkey(),
                        &[],
                        balance.raw,
                    ) {
                        Ok(instruction) => instruction,
                        Err(e) => {
                            return Ok(TransferOutcome::Failed {
                                wallet: wallet.pubkey(),
                                reason: e.to_string(),
                            })
                        }
                    };
                    Ok(self.submit(wallet, instruction, balance.raw).await)
                }
            })
            .collect();

        Ok(self.executor.run(ops).await?)
    }

    /// Moves each wallet's current native balance above `reserve` lamports
    /// to `destination`. Wallets at or below the reserve are skipped. A
    /// failed balance read aborts the batch.
    pub async fn drain_sol(
        &self,
        holdings: &[WalletBalance],
        destination: Pubkey,
        reserve: u64,
    ) -> Result<Vec<TransferOutcome>> {
        let ops: Vec<_> = holdings
            .iter()
            .map(|holding| {
                move || async move {
                    let wallet = &holding.wallet;
                    // Earlier token drains in the same run have spent fees.
                    let native = self.ledger.balance(&wallet.pubkey()).await?;
                    let lamports = native.saturating_sub(reserve);
                    if lamports == 0 {
                        return Ok::<_, anyhow::Error>(TransferOutcome::Skipped {
                            wallet: wallet.pubkey(),
                        });
                    }

                    let instruction =
                        system_instruction::transfer(&wallet.pubkey(), &destination, lamports);
                    Ok(self.submit(wallet, instruction, lamports).await)
                }
            })
            .collect();

        Ok(self.executor.run(ops).await?)
    }

    async fn submit(&self, wallet: &Wallet, instruction: Instruction, amount: u64) -> TransferOutcome {
        match self.send(wallet, instruction).await {
            Ok(signature) => TransferOutcome::Sent {
                wallet: wallet.pubkey(),
                amount,
                signature,
            },
            Err(e) => TransferOutcome::Failed {
                wallet: wallet.pubkey(),
                reason: format!("{:#}", e),
            },
        }
    }

    async fn send(&self, wallet: &Wallet, instruction: Instruction) -> Result<Signature> {
        let owner = wallet.pubkey();
        let blockhash = self.ledger.latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&owner),
            &[wallet.keypair()],
            blockhash,
        );
        self.ledger.send_and_confirm(&transaction).await
    }
}
