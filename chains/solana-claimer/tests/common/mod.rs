#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use solana_claimer::ledger::Ledger;
use solana_claimer::wallets::Wallet;
use solana_sdk::hash::Hash;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;
use spl_token::state::{Account as TokenAccount, AccountState, Mint};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

/// In-memory ledger. Sends succeed unless the fee payer is in `failing_payers`;
/// balance reads succeed unless the owner is in `failing_balances`.
#[derive(Default)]
pub struct MemoryLedger {
    balances: Mutex<HashMap<Pubkey, u64>>,
    failing_balances: Mutex<HashSet<Pubkey>>,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    failing_payers: Mutex<HashSet<Pubkey>>,
    sent: Mutex<Vec<Transaction>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, owner: Pubkey, lamports: u64) {
        self.balances.lock().unwrap().insert(owner, lamports);
    }

    pub fn add_mint(&self, mint: Pubkey, decimals: u8) {
        let state = Mint {
            decimals,
            is_initialized: true,
            ..Default::default()
        };
        let mut data = vec![0u8; Mint::LEN];
        Mint::pack(state, &mut data).unwrap();
        self.accounts.lock().unwrap().insert(mint, data);
    }

    /// Creates `owner`'s associated token account for `mint` and returns it.
    pub fn add_token_account(&self, owner: Pubkey, mint: Pubkey, amount: u64) -> Pubkey {
        let address = get_associated_token_address(&owner, &mint);
        let state = TokenAccount {
            mint,
            owner,
            amount,
            state: AccountState::Initialized,
            ..Default::default()
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(state, &mut data).unwrap();
        self.accounts.lock().unwrap().insert(address, data);
        address
    }

    pub fn fail_balance_of(&self, owner: Pubkey) {
        self.failing_balances.lock().unwrap().insert(owner);
    }

    pub fn fail_sends_from(&self, payer: Pubkey) {
        self.failing_payers.lock().unwrap().insert(payer);
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn balance(&self, owner: &Pubkey) -> Result<u64> {
        if self.failing_balances.lock().unwrap().contains(owner) {
            return Err(anyhow!("rpc request timed out"));
        }
        Ok(self.balances.lock().unwrap().get(owner).copied().unwrap_or(0))
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature> {
        let payer = transaction.message.account_keys[0];
        if self.failing_payers.lock().unwrap().contains(&payer) {
            return Err(anyhow!("insufficient funds for fee"));
        }
        self.sent.lock().unwrap().push(transaction.clone());
        Ok(transaction.signatures[0])
    }
}

pub fn wallets(count: usize) -> Vec<Wallet> {
    (0..count).map(|_| Wallet::new(Keypair::new())).collect()
}

/// Counts events logged on `target` on this thread until the guard drops.
pub fn count_events(target: &'static str) -> (DefaultGuard, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let layer = TargetCounter {
        target,
        count: count.clone(),
    };
    let guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));
    (guard, count)
}

struct TargetCounter {
    target: &'static str,
    count: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for TargetCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() == self.target {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}
