//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// This enum wraps all specific error types and provides a unified
/// error interface for the application layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Wallet(WalletError),

    #[error(transparent)]
    Network(NetworkError),
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<WalletError> for CoreError {
    fn from(e: WalletError) -> Self {
        CoreError::Wallet(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid RPC URL format: '{url}'")]
    InvalidRpcUrl { url: String },

    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },
}

/// Key file errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Failed to read key file '{path}': {msg}")]
    Io { path: String, msg: String },

    #[error("Key file '{path}' is not a JSON byte array: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("Key file '{path}' holds {length} bytes, expected {expected}")]
    InvalidKeyLength {
        path: String,
        expected: usize,
        length: usize,
    },

    #[error("No key file loaded for wallet {address}")]
    NotFound { address: String },
}

/// Network and RPC-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Request timeout after {timeout_ms}ms to {endpoint}")]
    Timeout { timeout_ms: u64, endpoint: String },

    #[error("Rate limited by {endpoint}")]
    RateLimited { endpoint: String },

    #[error("Connection refused to {endpoint}: {reason}")]
    ConnectionRefused { endpoint: String, reason: String },

    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl NetworkError {
    /// Whether a later attempt at the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::Timeout { .. }
            | NetworkError::RateLimited { .. }
            | NetworkError::ConnectionRefused { .. } => true,
            NetworkError::HttpError { status_code, .. } => *status_code >= 500,
            NetworkError::InvalidResponse { .. } => false,
        }
    }
}

/// Failure of a batch run.
///
/// `error` is not a `#[source]`: any `E: Display` is accepted, `anyhow::Error`
/// included.
#[derive(Error, Debug)]
pub enum BatchError<E> {
    #[error("batch operation {index} failed: {error:#}")]
    Operation { index: usize, error: E },

    #[error("batch operation {index} timed out after {after:?}")]
    TimedOut { index: usize, after: Duration },

    #[error("batch cancelled after {started} operations were started")]
    Cancelled { started: usize },
}

impl<E> BatchError<E> {
    /// Index of the operation that ended the run, if one did.
    pub fn index(&self) -> Option<usize> {
        match self {
            BatchError::Operation { index, .. } | BatchError::TimedOut { index, .. } => {
                Some(*index)
            }
            BatchError::Cancelled { .. } => None,
        }
    }
}
