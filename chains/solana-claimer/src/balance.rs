//! Per-wallet balance snapshot: native lamports plus the base and quote
//! token accounts at their associated addresses.

use crate::ledger::Ledger;
use crate::wallets::Wallet;
use anyhow::Result;
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainAsset {
    Base,
    Quote,
}

impl fmt::Display for DrainAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainAsset::Base => write!(f, "BASE"),
            DrainAsset::Quote => write!(f, "QUOTE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetBalance {
    pub mint: Pubkey,
    /// Associated token account of the owner for `mint`.
    pub account: Pubkey,
    pub has_account: bool,
    pub raw: u64,
    pub decimals: u8,
    pub ui_amount: f64,
}

impl AssetBalance {
    fn new(mint: Pubkey, account: Pubkey, raw: Option<u64>, decimals: u8) -> Self {
        let has_account = raw.is_some();
        let raw = raw.unwrap_or(0);
        Self {
            mint,
            account,
            has_account,
            raw,
            decimals,
            ui_amount: to_ui_amount(raw, decimals),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSnapshot {
    pub owner: Pubkey,
    /// Native balance in lamports.
    pub native: u64,
    pub base: AssetBalance,
    pub quote: AssetBalance,
}

impl BalanceSnapshot {
    pub fn sol(&self) -> f64 {
        lamports_to_sol(self.native)
    }

    pub fn asset(&self, asset: DrainAsset) -> &AssetBalance {
        match asset {
            DrainAsset::Base => &self.base,
            DrainAsset::Quote => &self.quote,
        }
    }
}

/// A loaded wallet together with its latest snapshot.
#[derive(Debug, Clone)]
pub struct WalletBalance {
    pub wallet: Wallet,
    pub balance: BalanceSnapshot,
}

pub fn to_ui_amount(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Reads one wallet's balances. All five lookups run concurrently; any
/// ledger error fails the whole snapshot.
pub async fn inspect(
    ledger: &dyn Ledger,
    owner: Pubkey,
    base_mint: &Pubkey,
    quote_mint: &Pubkey,
) -> Result<BalanceSnapshot> {
    let base_account = get_associated_token_address(&owner, base_mint);
    let quote_account = get_associated_token_address(&owner, quote_mint);

    let (native, base_state, quote_state, base_decimals, quote_decimals) = tokio::try_join!(
        ledger.balance(&owner),
        ledger.token_account(&base_account),
        ledger.token_account(&quote_account),
        ledger.mint_decimals(base_mint),
        ledger.mint_decimals(quote_mint),
    )?;

    Ok(BalanceSnapshot {
        owner,
        native,
        base: AssetBalance::new(
            *base_mint,
            base_account,
            base_state.map(|a| a.amount),
            base_decimals,
        ),
        quote: AssetBalance::new(
            *quote_mint,
            quote_account,
            quote_state.map(|a| a.amount),
            quote_decimals,
        ),
    })
}
