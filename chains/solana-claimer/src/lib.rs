//! # Solana Claimer
//!
//! Batch operations over a folder of Solana keypairs: balance inspection,
//! airdrop eligibility checks, merkle-distributor claims and draining of
//! token and native balances to fixed destinations.
//!
//! Every per-wallet operation runs through [`core_logic::BatchExecutor`].

pub mod balance;
pub mod claim;
pub mod cli;
pub mod commands;
pub mod config;
pub mod drain;
pub mod eligibility;
pub mod ledger;
pub mod wallets;

pub use balance::{AssetBalance, BalanceSnapshot, DrainAsset, WalletBalance};
pub use claim::{ClaimOutcome, Claimer};
pub use crate::config::ClaimerConfig;
pub use drain::{Drainer, TransferOutcome};
pub use eligibility::{EligibilityRecord, EligibilityStatus, EligibilitySummary, ProofClient};
pub use ledger::{Ledger, RpcLedger};
pub use wallets::Wallet;
