use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use spl_token::state::{Account as TokenAccount, Mint};
use std::time::Duration;

/// Everything the claimer needs from the ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Native balance in lamports.
    async fn balance(&self, owner: &Pubkey) -> Result<u64>;

    /// Raw account data, `None` when the account does not exist.
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool> {
        Ok(self.account_data(address).await?.is_some())
    }

    async fn token_account(&self, address: &Pubkey) -> Result<Option<TokenAccount>> {
        match self.account_data(address).await? {
            Some(data) => {
                let account = TokenAccount::unpack(&data)
                    .with_context(|| format!("{} is not a token account", address))?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8> {
        let data = self
            .account_data(mint)
            .await?
            .ok_or_else(|| anyhow!("Mint {} does not exist", mint))?;
        let mint_state =
            Mint::unpack(&data).with_context(|| format!("{} is not a token mint", mint))?;
        Ok(mint_state.decimals)
    }
}

pub struct RpcLedger {
    client: RpcClient,
}

impl RpcLedger {
    pub fn new(rpc_url: &str, timeout: Duration) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            rpc_url.to_string(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self { client }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn balance(&self, owner: &Pubkey) -> Result<u64> {
        self.client
            .get_balance(owner)
            .await
            .with_context(|| format!("Failed to fetch balance of {}", owner))
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await
            .with_context(|| format!("Failed to fetch account {}", address))?;
        Ok(response.value.map(|account| account.data))
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .context("Failed to fetch latest blockhash")
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature> {
        self.client
            .send_and_confirm_transaction(transaction)
            .await
            .context("Transaction was not confirmed")
    }
}
