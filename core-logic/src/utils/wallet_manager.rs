use crate::error::{ConfigError, CoreError, WalletError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Raw secret key bytes read from one key file. Zeroed on drop.
pub struct SecretKeyFile {
    path: PathBuf,
    bytes: Zeroizing<Vec<u8>>,
}

impl SecretKeyFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SecretKeyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKeyFile")
            .field("path", &self.path)
            .field("bytes", &"***REDACTED***")
            .finish()
    }
}

/// Key files of the managed wallets: one `*.json` file per wallet, each a
/// JSON array of secret key bytes.
#[derive(Debug)]
pub struct WalletManager {
    dir: PathBuf,
    files: Vec<PathBuf>,
    expected_len: Option<usize>,
}

impl WalletManager {
    pub const KEYS_DIR: &'static str = "keys";

    /// Scans `dir` for key files, sorted by file name.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, CoreError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(ConfigError::FileNotFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        let entries = fs::read_dir(&dir).map_err(|e| ConfigError::IoError {
            path: dir.display().to_string(),
            msg: e.to_string(),
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|res| res.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        info!("Found {} key files in {:?}", files.len(), dir);

        Ok(Self {
            dir,
            files,
            expected_len: None,
        })
    }

    /// Rejects key files whose byte count differs from `len`.
    pub fn with_expected_len(mut self, len: usize) -> Self {
        self.expected_len = Some(len);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the number of available key files
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// List key file names without reading them
    pub fn list_wallets(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown.json")
                    .to_string()
            })
            .collect()
    }

    /// Reads every key file. The first malformed file fails the whole load.
    pub fn load_all(&self) -> Result<Vec<SecretKeyFile>, WalletError> {
        self.files
            .iter()
            .map(|path| self.read_key_file(path))
            .collect()
    }

    fn read_key_file(&self, path: &Path) -> Result<SecretKeyFile, WalletError> {
        let display = path.display().to_string();
        let content = Zeroizing::new(fs::read_to_string(path).map_err(|e| WalletError::Io {
            path: display.clone(),
            msg: e.to_string(),
        })?);

        let bytes: Vec<u8> =
            serde_json::from_str(&content).map_err(|e| WalletError::DecodeFailed {
                path: display.clone(),
                reason: e.to_string(),
            })?;
        let bytes = Zeroizing::new(bytes);

        if let Some(expected) = self.expected_len {
            if bytes.len() != expected {
                return Err(WalletError::InvalidKeyLength {
                    path: display,
                    expected,
                    length: bytes.len(),
                });
            }
        }

        debug!("Loaded key file {}", path.display());
        Ok(SecretKeyFile {
            path: path.to_path_buf(),
            bytes,
        })
    }
}
