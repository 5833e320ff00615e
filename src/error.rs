//! Error types for photostore
//!
//! Provides the per-call storage error taxonomy and the startup
//! provisioning error. Provisioning failures are fatal: they abort
//! initialization instead of surfacing as per-call results.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for storage operations
///
/// Every variant is a per-call outcome returned to the caller; nothing
/// here is thrown as an uncatchable fault.
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Precondition violations
    // -------------------------------------------------------------------------
    #[error("invalid key: {0}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Bad data already persisted
    // -------------------------------------------------------------------------
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    // -------------------------------------------------------------------------
    // Backing store failures
    // -------------------------------------------------------------------------
    #[error("store unavailable: {0}")]
    Unavailable(String),

    // -------------------------------------------------------------------------
    // Lookup misses
    // -------------------------------------------------------------------------
    #[error("not found")]
    NotFound,
}

impl From<std::io::Error> for StoreError {
    /// I/O failures from the backing store surface as `Unavailable`.
    /// Retries, if desired, belong to the caller.
    fn from(e: std::io::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Errors raised while provisioning tables at startup
///
/// These are fatal: the engine must not start in a half-configured state.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("provisioning IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table log corrupt: {0}")]
    Corrupt(String),

    #[error("invalid table spec: {0}")]
    Invalid(String),
}
