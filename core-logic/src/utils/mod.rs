//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

// Internal modules - not part of public API
pub(crate) mod batch;
pub(crate) mod logger;
pub(crate) mod retry;
pub(crate) mod wallet_manager;

// Selective exports - only public utilities
pub use batch::BatchExecutor;
pub use logger::setup_logger;
pub use wallet_manager::{SecretKeyFile, WalletManager};
