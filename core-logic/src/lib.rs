//! # Core Logic - Shared Utilities for Wallet Batch Tools
//!
//! This crate provides the chain-agnostic pieces used by the chain crates:
//! the bounded-concurrency batch executor, key file loading, logging,
//! retry helpers and the error taxonomy.
//!
//! ## Modules
//!
//! - [`config`] - Executor configuration
//! - [`error`] - Typed error handling with thiserror
//! - [`utils`] - Batch executor, wallet keys, logger, retry

// Module declarations - internal modules marked pub(crate)
pub mod config;
pub mod error;
pub(crate) mod utils;

// Selective exports - only public API types
pub use config::{BatchMode, ExecutorConfig};
pub use error::{BatchError, ConfigError, CoreError, NetworkError, WalletError};

// Utils are pub(crate) - only export specific public utilities
pub use utils::{setup_logger, BatchExecutor, SecretKeyFile, WalletManager};

// Export retry utilities for testing
pub use utils::retry::{is_transient_error, with_retry, with_retry_if, RetryConfig};
