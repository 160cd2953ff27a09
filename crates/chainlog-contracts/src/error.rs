//! Error types for the chainlog ledger.
//!
//! Every fallible ledger operation returns `LedgerResult<T>`.  Corruption
//! found by the verifier is not an error: it is reported through
//! `VerificationReport`.

use thiserror::Error;

/// The unified error type for the ledger crates.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store could not be read or written.
    ///
    /// An append that fails with this error left nothing persisted.
    #[error("ledger storage failure: {reason}")]
    Storage { reason: String },

    /// A payload or block could not be encoded or decoded.
    #[error("serialization failure: {reason}")]
    Serialization { reason: String },

    /// A stored block could not be decoded into a `Block`.
    #[error("corrupt ledger record at block {sequence}: {reason}")]
    CorruptRecord { sequence: u64, reason: String },

    /// A record request was rejected at the boundary before any write.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the chainlog crates.
pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization {
            reason: e.to_string(),
        }
    }
}
