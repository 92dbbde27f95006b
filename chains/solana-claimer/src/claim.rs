use crate::config::DistributionSettings;
use crate::eligibility::{ClaimProof, ProofClient};
use crate::ledger::Ledger;
use crate::wallets::{find_wallet, Wallet};
use anyhow::{anyhow, Result};
use borsh::BorshSerialize;
use core_logic::{BatchExecutor, WalletError};
use solana_sdk::hash::hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account;
use std::fmt;
use std::sync::Arc;

pub const CLAIM_STATUS_SEED: &[u8] = b"ClaimStatus";

#[derive(BorshSerialize)]
struct NewClaimArgs {
    amount_unlocked: u64,
    amount_locked: u64,
    proof: Vec<[u8; 32]>,
}

/// Anchor instruction discriminator: first 8 bytes of sha256("global:<name>").
fn discriminator(name: &str) -> [u8; 8] {
    let digest = hash(format!("global:{}", name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.to_bytes()[..8]);
    out
}

pub fn claim_status_address(program_id: &Pubkey, claimant: &Pubkey, distributor: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[CLAIM_STATUS_SEED, claimant.as_ref(), distributor.as_ref()],
        program_id,
    )
    .0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimAccounts {
    pub distributor: Pubkey,
    pub claim_status: Pubkey,
    /// Distributor's token account holding the drop.
    pub from: Pubkey,
    /// Claimant's associated token account for the drop mint.
    pub to: Pubkey,
    pub claimant: Pubkey,
}

impl ClaimAccounts {
    pub fn derive(program_id: &Pubkey, mint: &Pubkey, claimant: &Pubkey, distributor: &Pubkey) -> Self {
        Self {
            distributor: *distributor,
            claim_status: claim_status_address(program_id, claimant, distributor),
            from: get_associated_token_address(distributor, mint),
            to: get_associated_token_address(claimant, mint),
            claimant: *claimant,
        }
    }
}

pub fn new_claim_instruction(
    program_id: &Pubkey,
    accounts: &ClaimAccounts,
    proof: &ClaimProof,
) -> Result<Instruction> {
    let args = NewClaimArgs {
        amount_unlocked: proof.amount,
        amount_locked: 0,
        proof: proof.proof.clone(),
    };

    let mut data = discriminator("new_claim").to_vec();
    args.serialize(&mut data)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.distributor, false),
            AccountMeta::new(accounts.claim_status, false),
            AccountMeta::new(accounts.from, false),
            AccountMeta::new(accounts.to, false),
            AccountMeta::new(accounts.claimant, true),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Built but not sent; `instructions` counts the ATA creation if needed.
    DryRun {
        wallet: Pubkey,
        amount: u64,
        instructions: usize,
    },
    Submitted {
        wallet: Pubkey,
        signature: Signature,
    },
    Failed {
        wallet: Pubkey,
        reason: String,
    },
}

impl ClaimOutcome {
    pub fn wallet(&self) -> &Pubkey {
        match self {
            ClaimOutcome::DryRun { wallet, .. }
            | ClaimOutcome::Submitted { wallet, .. }
            | ClaimOutcome::Failed { wallet, .. } => wallet,
        }
    }
}

impl fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimOutcome::DryRun { wallet, amount, .. } => {
                write!(f, "{} dry run, {} claimable (pass --execute to send)", wallet, amount)
            }
            ClaimOutcome::Submitted { wallet, signature } => write!(f, "{} DONE {}", wallet, signature),
            ClaimOutcome::Failed { wallet, reason } => write!(f, "{} FAILED {}", wallet, reason),
        }
    }
}

pub struct Claimer {
    ledger: Arc<dyn Ledger>,
    proofs: Arc<ProofClient>,
    distribution: DistributionSettings,
    execute: bool,
}

impl Claimer {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        proofs: Arc<ProofClient>,
        distribution: DistributionSettings,
        execute: bool,
    ) -> Self {
        Self {
            ledger,
            proofs,
            distribution,
            execute,
        }
    }

    /// Claims for every allow-listed address, in allow-list order.
    pub async fn claim_all(
        &self,
        executor: &BatchExecutor,
        wallets: &[Wallet],
        allow_list: &[Pubkey],
    ) -> Result<Vec<ClaimOutcome>> {
        let ops: Vec<_> = allow_list
            .iter()
            .map(|address| {
                let address = *address;
                move || async move { Ok::<_, anyhow::Error>(self.claim(wallets, address).await) }
            })
            .collect();

        Ok(executor.run(ops).await?)
    }

    /// One claim attempt. Never fails; problems come back as `Failed`.
    pub async fn claim(&self, wallets: &[Wallet], address: Pubkey) -> ClaimOutcome {
        let result = match find_wallet(wallets, &address) {
            Some(wallet) => self.try_claim(wallet).await,
            None => Err(WalletError::NotFound {
                address: address.to_string(),
            }
            .into()),
        };

        result.unwrap_or_else(|e| ClaimOutcome::Failed {
            wallet: address,
            reason: format!("{:#}", e),
        })
    }

    async fn try_claim(&self, wallet: &Wallet) -> Result<ClaimOutcome> {
        let claimant = wallet.pubkey();
        let proof = self.proofs.fetch_proof(&claimant).await?;

        let accounts = ClaimAccounts::derive(
            &self.distribution.program_id,
            &self.distribution.token_mint,
            &claimant,
            &proof.distributor,
        );

        let mut instructions = Vec::with_capacity(2);
        if !self.ledger.account_exists(&accounts.to).await? {
            instructions.push(create_associated_token_account(
                &claimant,
                &claimant,
                &self.distribution.token_mint,
                &spl_token::id(),
            ));
        }
        instructions.push(new_claim_instruction(
            &self.distribution.program_id,
            &accounts,
            &proof,
        )?);

        if !self.execute {
            return Ok(ClaimOutcome::DryRun {
                wallet: claimant,
                amount: proof.amount,
                instructions: instructions.len(),
            });
        }

        let blockhash = self.ledger.latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&claimant),
            &[wallet.keypair()],
            blockhash,
        );
        let signature = self
            .ledger
            .send_and_confirm(&transaction)
            .await
            .map_err(|e| anyhow!("claim transaction failed: {:#}", e))?;

        Ok(ClaimOutcome::Submitted {
            wallet: claimant,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use borsh::BorshDeserialize;

    #[derive(BorshDeserialize)]
    struct DecodedArgs {
        amount_unlocked: u64,
        amount_locked: u64,
        proof: Vec<[u8; 32]>,
    }

    #[test]
    fn test_discriminator_matches_anchor() {
        let digest = hash(b"global:new_claim").to_bytes();
        assert_eq!(discriminator("new_claim"), digest[..8]);
    }

    #[test]
    fn test_claim_status_is_deterministic() {
        let program = Pubkey::new_unique();
        let claimant = Pubkey::new_unique();
        let distributor = Pubkey::new_unique();

        let a = claim_status_address(&program, &claimant, &distributor);
        let b = claim_status_address(&program, &claimant, &distributor);
        assert_eq!(a, b);
        assert_ne!(a, claim_status_address(&program, &distributor, &claimant));
    }

    #[test]
    fn test_new_claim_layout() {
        let program = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let claimant = Pubkey::new_unique();
        let distributor = Pubkey::new_unique();
        let accounts = ClaimAccounts::derive(&program, &mint, &claimant, &distributor);
        let proof = ClaimProof {
            amount: 1_234,
            proof: vec![[7u8; 32], [9u8; 32]],
            distributor,
        };

        let ix = new_claim_instruction(&program, &accounts, &proof).unwrap();

        assert_eq!(ix.program_id, program);
        assert_eq!(ix.data[..8], discriminator("new_claim"));
        let args = DecodedArgs::try_from_slice(&ix.data[8..]).unwrap();
        assert_eq!(args.amount_unlocked, 1_234);
        assert_eq!(args.amount_locked, 0);
        assert_eq!(args.proof, proof.proof);

        let keys: Vec<_> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(
            keys,
            vec![
                distributor,
                accounts.claim_status,
                get_associated_token_address(&distributor, &mint),
                get_associated_token_address(&claimant, &mint),
                claimant,
                spl_token::id(),
                system_program::id(),
            ]
        );
        let signers: Vec<_> = ix.accounts.iter().filter(|m| m.is_signer).collect();
        assert_eq!(signers.len(), 1);
        assert_eq!(signers[0].pubkey, claimant);
    }
}
