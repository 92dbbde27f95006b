use anyhow::{Context, Result};
use core_logic::{SecretKeyFile, WalletError, WalletManager};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Length of a Solana keypair file: 32 secret bytes followed by the public key.
pub const KEYPAIR_LEN: usize = 64;

#[derive(Clone)]
pub struct Wallet {
    keypair: Arc<Keypair>,
    address: String,
}

impl Wallet {
    pub fn new(keypair: Keypair) -> Self {
        let address = keypair.pubkey().to_string();
        Self {
            keypair: Arc::new(keypair),
            address,
        }
    }

    pub fn from_key_file(file: &SecretKeyFile) -> Result<Self, WalletError> {
        let keypair = Keypair::from_bytes(file.bytes()).map_err(|e| WalletError::DecodeFailed {
            path: file.path().display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Loads every keypair file in `dir`, in file-name order.
pub fn load_wallets(dir: impl AsRef<Path>) -> Result<Vec<Wallet>> {
    let dir = dir.as_ref();
    let manager = WalletManager::new(dir)?.with_expected_len(KEYPAIR_LEN);
    let files = manager
        .load_all()
        .with_context(|| format!("Failed to load keys from {}", dir.display()))?;

    let wallets = files
        .iter()
        .map(Wallet::from_key_file)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(wallets)
}

pub fn find_wallet<'a>(wallets: &'a [Wallet], address: &Pubkey) -> Option<&'a Wallet> {
    wallets.iter().find(|wallet| wallet.pubkey() == *address)
}
