//! Claim proof lookups against the distribution's proof service.
//!
//! `fetch` is used by `check` and never fails: every problem becomes an
//! amount of 0 with a status saying why. `fetch_proof` is used by `claim`
//! and returns the error instead.

use anyhow::{anyhow, bail, Context, Result};
use core_logic::{is_transient_error, with_retry_if, NetworkError, RetryConfig};
use reqwest::StatusCode;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, Deserialize)]
struct ProofResponse {
    #[serde(default)]
    amount: Option<u64>,
    #[serde(default)]
    proof: Vec<Vec<u8>>,
    #[serde(default)]
    merkle_tree: Option<String>,
}

/// Everything the claim instruction needs from the proof service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimProof {
    pub amount: u64,
    pub proof: Vec<[u8; 32]>,
    /// Distributor account of the merkle tree holding this leaf.
    pub distributor: Pubkey,
}

impl TryFrom<ProofResponse> for ClaimProof {
    type Error = anyhow::Error;

    fn try_from(response: ProofResponse) -> Result<Self> {
        let amount = match response.amount {
            Some(amount) if amount > 0 => amount,
            _ => bail!("no proof data, wallet likely not eligible"),
        };

        let proof = response
            .proof
            .into_iter()
            .enumerate()
            .map(|(i, node)| {
                <[u8; 32]>::try_from(node.as_slice())
                    .map_err(|_| anyhow!("proof node {} has {} bytes, expected 32", i, node.len()))
            })
            .collect::<Result<Vec<_>>>()?;

        let tree = response
            .merkle_tree
            .ok_or_else(|| anyhow!("proof response has no merkle_tree"))?;
        let distributor = Pubkey::from_str(&tree)
            .map_err(|e| anyhow!("invalid merkle_tree '{}': {}", tree, e))?;

        Ok(Self {
            amount,
            proof,
            distributor,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityStatus {
    Eligible,
    /// The service answered and has no allocation for the wallet.
    NotEligible,
    /// The lookup itself failed; the wallet may or may not be eligible.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityRecord {
    pub wallet: Pubkey,
    /// Raw allocation; 0 whenever `status` is not `Eligible`.
    pub amount: u64,
    pub status: EligibilityStatus,
    pub proof: Option<ClaimProof>,
}

impl EligibilityRecord {
    fn empty(wallet: Pubkey, status: EligibilityStatus) -> Self {
        Self {
            wallet,
            amount: 0,
            status,
            proof: None,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.amount > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EligibilitySummary {
    pub total_raw: u64,
    /// `total_raw` scaled down by the token's decimals.
    pub total: f64,
    /// Wallets with a positive allocation, in input order.
    pub drop_wallets: Vec<Pubkey>,
    pub not_eligible: usize,
    pub unavailable: usize,
}

impl EligibilitySummary {
    pub fn from_records(records: &[EligibilityRecord], decimals: u8) -> Self {
        let total_raw = records.iter().map(|r| r.amount).sum::<u64>();
        let drop_wallets = records
            .iter()
            .filter(|r| r.is_eligible())
            .map(|r| r.wallet)
            .collect();
        let not_eligible = records
            .iter()
            .filter(|r| r.status == EligibilityStatus::NotEligible)
            .count();
        let unavailable = records
            .iter()
            .filter(|r| matches!(r.status, EligibilityStatus::Unavailable(_)))
            .count();

        Self {
            total_raw,
            total: crate::balance::to_ui_amount(total_raw, decimals),
            drop_wallets,
            not_eligible,
            unavailable,
        }
    }
}

pub struct ProofClient {
    http: reqwest::Client,
    endpoint: String,
    token_mint: Pubkey,
    retry: RetryConfig,
}

impl ProofClient {
    pub fn new(endpoint: &str, token_mint: Pubkey, retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token_mint,
            retry: RetryConfig::new(retries, 500),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn proof_url(&self, wallet: &Pubkey) -> String {
        format!("{}/{}/{}", self.endpoint, self.token_mint, wallet)
    }

    /// Looks up one wallet. Never fails.
    pub async fn fetch(&self, wallet: Pubkey) -> EligibilityRecord {
        let response = match self.lookup(&wallet).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                info!(target: "task_result", "checked: {} 0", wallet);
                return EligibilityRecord::empty(wallet, EligibilityStatus::NotEligible);
            }
            Err(e) => {
                warn!(target: "task_result", "ERROR {}: {:#}", wallet, e);
                return EligibilityRecord::empty(
                    wallet,
                    EligibilityStatus::Unavailable(format!("{:#}", e)),
                );
            }
        };

        let amount = response.amount.unwrap_or(0);
        if amount == 0 {
            warn!(target: "task_result", "ERROR {}: no proof data, wallet likely not eligible", wallet);
            return EligibilityRecord::empty(wallet, EligibilityStatus::NotEligible);
        }

        info!(target: "task_result", "checked: {} {}", wallet, amount);
        EligibilityRecord {
            wallet,
            amount,
            status: EligibilityStatus::Eligible,
            proof: ClaimProof::try_from(response).ok(),
        }
    }

    /// Looks up one wallet and decodes the full claim proof.
    pub async fn fetch_proof(&self, wallet: &Pubkey) -> Result<ClaimProof> {
        let response = self
            .lookup(wallet)
            .await?
            .ok_or_else(|| anyhow!("no proof data, wallet likely not eligible"))?;
        ClaimProof::try_from(response)
    }

    /// `Ok(None)` when the service reports no record for the wallet.
    async fn lookup(&self, wallet: &Pubkey) -> Result<Option<ProofResponse>> {
        let url = self.proof_url(wallet);
        with_retry_if(
            self.retry.clone(),
            &format!("proof lookup for {}", wallet),
            is_transient_error,
            || self.get(&url),
        )
        .await
    }

    async fn get(&self, url: &str) -> Result<Option<ProofResponse>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(NetworkError::RateLimited {
                    endpoint: url.to_string(),
                }
                .into())
            }
            status if !status.is_success() => {
                return Err(NetworkError::HttpError {
                    status_code: status.as_u16(),
                    endpoint: url.to_string(),
                }
                .into())
            }
            _ => {}
        }

        let body = response
            .json::<ProofResponse>()
            .await
            .map_err(|e| NetworkError::InvalidResponse {
                endpoint: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(body))
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> NetworkError {
    let endpoint = url.to_string();
    if e.is_timeout() {
        NetworkError::Timeout {
            timeout_ms: REQUEST_TIMEOUT.as_millis() as u64,
            endpoint,
        }
    } else if e.is_connect() {
        NetworkError::ConnectionRefused {
            endpoint,
            reason: e.to_string(),
        }
    } else {
        NetworkError::InvalidResponse {
            endpoint,
            reason: e.to_string(),
        }
    }
}
