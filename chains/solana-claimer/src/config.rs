use anyhow::{Context, Result};
use config::{Config, Environment, File};
use core_logic::{ConfigError, ExecutorConfig};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "claimer.toml";

/// Merkle distributor program; the same program serves several drops.
pub const DEFAULT_PROGRAM_ID: &str = "meRjbQXFNf5En86FXT2YPz1dQzLj4Yb3xK8u1MVgqpb";
pub const DEFAULT_TOKEN_MINT: &str = "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN";
pub const DEFAULT_PROOF_ENDPOINT: &str = "https://worker.jup.ag/jup-claim-proof";

/// Raw settings as read from the config file and the environment.
/// Nothing here is trusted until one of the `validate_*` methods accepts it.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimerConfig {
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    #[serde(default)]
    pub base_mint: String,
    #[serde(default)]
    pub quote_mint: String,
    #[serde(default = "default_keys_dir")]
    pub keys_dir: String,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub distribution: DistributionConfig,
    #[serde(default)]
    pub drain: DrainConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistributionConfig {
    #[serde(default = "default_program_id")]
    pub program_id: String,
    #[serde(default = "default_token_mint")]
    pub token_mint: String,
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,
    #[serde(default = "default_proof_endpoint")]
    pub proof_endpoint: String,
    #[serde(default = "default_proof_retries")]
    pub proof_retries: u32,
    #[serde(default)]
    pub drop_wallets: Vec<String>,
    #[serde(default = "default_drop_wallets_file")]
    pub drop_wallets_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrainConfig {
    pub base_destination: Option<String>,
    pub quote_destination: Option<String>,
    pub sol_destination: Option<String>,
    #[serde(default = "default_sol_fee_reserve")]
    pub sol_fee_reserve: u64,
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_keys_dir() -> String {
    core_logic::WalletManager::KEYS_DIR.to_string()
}

fn default_program_id() -> String {
    DEFAULT_PROGRAM_ID.to_string()
}

fn default_token_mint() -> String {
    DEFAULT_TOKEN_MINT.to_string()
}

fn default_token_decimals() -> u8 {
    6
}

fn default_proof_endpoint() -> String {
    DEFAULT_PROOF_ENDPOINT.to_string()
}

fn default_proof_retries() -> u32 {
    2
}

fn default_drop_wallets_file() -> String {
    "drop_wallets.json".to_string()
}

fn default_sol_fee_reserve() -> u64 {
    5000
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            token_mint: default_token_mint(),
            token_decimals: default_token_decimals(),
            proof_endpoint: default_proof_endpoint(),
            proof_retries: default_proof_retries(),
            drop_wallets: Vec::new(),
            drop_wallets_file: default_drop_wallets_file(),
        }
    }
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            base_destination: None,
            quote_destination: None,
            sol_destination: None,
            sol_fee_reserve: default_sol_fee_reserve(),
        }
    }
}

/// Ledger connection settings, validated.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub rpc_url: String,
    pub rpc_timeout: Duration,
}

/// The two token mints whose balances `check` and `drain` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintSettings {
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
}

/// Distribution settings, validated.
#[derive(Debug, Clone)]
pub struct DistributionSettings {
    pub program_id: Pubkey,
    pub token_mint: Pubkey,
    pub token_decimals: u8,
    pub proof_endpoint: String,
    pub proof_retries: u32,
}

impl ClaimerConfig {
    /// Reads `path` (optional) and the environment.
    ///
    /// `RPC_MAINNET`, `BASE_MINT` and `QUOTE_MINT` are read as-is; every other
    /// field can be set as `CLAIMER_<FIELD>`, with `__` between nested keys
    /// (`CLAIMER_DRAIN__SOL_DESTINATION`).
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("CLAIMER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("distribution.drop_wallets")
                    .try_parsing(true),
            )
            .set_override_option("rpc_url", env::var("RPC_MAINNET").ok())?
            .set_override_option("base_mint", env::var("BASE_MINT").ok())?
            .set_override_option("quote_mint", env::var("QUOTE_MINT").ok())?
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Invalid configuration in {}", path))
    }

    pub fn validate_network(&self) -> Result<NetworkSettings, ConfigError> {
        let rpc_url = self.rpc_url.trim();
        if rpc_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "rpc_url".to_string(),
            });
        }
        if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
            return Err(ConfigError::InvalidRpcUrl {
                url: rpc_url.to_string(),
            });
        }
        if self.rpc_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rpc_timeout_secs".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(NetworkSettings {
            rpc_url: rpc_url.to_string(),
            rpc_timeout: Duration::from_secs(self.rpc_timeout_secs),
        })
    }

    /// Only the commands that read token balances need the mints.
    pub fn validate_mints(&self) -> Result<MintSettings, ConfigError> {
        Ok(MintSettings {
            base_mint: parse_pubkey("base_mint", &self.base_mint)?,
            quote_mint: parse_pubkey("quote_mint", &self.quote_mint)?,
        })
    }

    pub fn validate_executor(&self) -> Result<ExecutorConfig, ConfigError> {
        if self.executor.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "executor.concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.executor.op_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "executor.op_timeout_secs".to_string(),
                reason: "must be positive when set".to_string(),
            });
        }
        Ok(self.executor.clone())
    }

    pub fn validate_distribution(&self) -> Result<DistributionSettings, ConfigError> {
        let d = &self.distribution;
        let endpoint = d.proof_endpoint.trim().trim_end_matches('/');
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "distribution.proof_endpoint".to_string(),
                reason: format!("'{}' is not an http(s) URL", d.proof_endpoint),
            });
        }

        Ok(DistributionSettings {
            program_id: parse_pubkey("distribution.program_id", &d.program_id)?,
            token_mint: parse_pubkey("distribution.token_mint", &d.token_mint)?,
            token_decimals: d.token_decimals,
            proof_endpoint: endpoint.to_string(),
            proof_retries: d.proof_retries,
        })
    }

    pub fn base_destination(&self) -> Result<Pubkey, ConfigError> {
        required_pubkey("drain.base_destination", &self.drain.base_destination)
    }

    pub fn quote_destination(&self) -> Result<Pubkey, ConfigError> {
        required_pubkey("drain.quote_destination", &self.drain.quote_destination)
    }

    pub fn sol_destination(&self) -> Result<Pubkey, ConfigError> {
        required_pubkey("drain.sol_destination", &self.drain.sol_destination)
    }

    pub fn drop_wallets_path(&self) -> PathBuf {
        PathBuf::from(&self.distribution.drop_wallets_file)
    }

    /// The claim allow-list: `distribution.drop_wallets` followed by the
    /// entries of the drop-wallet file that are not already listed.
    /// An empty allow-list is an error.
    pub fn drop_wallets(&self) -> Result<Vec<Pubkey>, ConfigError> {
        let mut entries = self.distribution.drop_wallets.clone();

        let path = self.drop_wallets_path();
        if path.exists() {
            for entry in read_drop_wallets(&path)? {
                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
        }

        if entries.is_empty() {
            return Err(ConfigError::MissingField {
                field: format!(
                    "distribution.drop_wallets (or {}); run `check --execute` first",
                    path.display()
                ),
            });
        }

        entries
            .iter()
            .map(|entry| parse_pubkey("distribution.drop_wallets", entry))
            .collect()
    }

    /// Writes the drop-wallet file read back by [`Self::drop_wallets`].
    pub fn save_drop_wallets(&self, wallets: &[Pubkey]) -> Result<PathBuf> {
        let path = self.drop_wallets_path();
        let entries: Vec<String> = wallets.iter().map(|w| w.to_string()).collect();
        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write drop wallets to {}", path.display()))?;
        Ok(path)
    }
}

fn read_drop_wallets(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        msg: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
        field: path.display().to_string(),
        reason: format!("expected a JSON array of addresses: {}", e),
    })
}

fn required_pubkey(field: &str, value: &Option<String>) -> Result<Pubkey, ConfigError> {
    match value {
        Some(v) => parse_pubkey(field, v),
        None => Err(ConfigError::MissingField {
            field: field.to_string(),
        }),
    }
}

pub(crate) fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::MissingField {
            field: field.to_string(),
        });
    }
    Pubkey::from_str(value).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: format!("'{}' is not a valid address: {}", value, e),
    })
}
