//! Integrity report and statistics types.
//!
//! The verifier walks the whole chain and returns a `VerificationReport`.
//! A broken chain is a normal result, not an error: the caller decides
//! whether to alert, stop writing, or carry on.

use serde::{Deserialize, Serialize};

/// The two ways a block can fail verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainErrorKind {
    /// The block's `previous_hash` is not the stored `current_hash` of the
    /// block before it (or the genesis sentinel for the first block).
    PreviousHashMismatch,

    /// The block's stored `current_hash` does not match the hash recomputed
    /// from its own fields.  Signals tampering with type, payload, or
    /// timestamp after the fact.
    CurrentHashMismatch,
}

impl ChainErrorKind {
    /// Human-readable description placed in `ChainError::error`.
    pub fn description(&self) -> &'static str {
        match self {
            ChainErrorKind::PreviousHashMismatch => "previous hash does not match",
            ChainErrorKind::CurrentHashMismatch => {
                "current hash does not match (possible tampering)"
            }
        }
    }
}

/// A single mismatch found during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainError {
    /// Sequence number of the offending block.
    pub block: u64,
    pub kind: ChainErrorKind,
    /// Same as `kind.description()`, kept for readers of the JSON report.
    pub error: String,
    pub expected: String,
    pub found: String,
}

impl ChainError {
    pub fn new(block: u64, kind: ChainErrorKind, expected: String, found: String) -> Self {
        Self {
            block,
            kind,
            error: kind.description().to_string(),
            expected,
            found,
        }
    }
}

/// The outcome of verifying the full chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True only if `errors` is empty.
    pub valid: bool,
    pub total_blocks: u64,
    /// Every mismatch, in chain order.  Empty on a valid chain.
    pub errors: Vec<ChainError>,
}

impl VerificationReport {
    /// Build a report, deriving `valid` from the error list.
    pub fn from_errors(total_blocks: u64, errors: Vec<ChainError>) -> Self {
        Self {
            valid: errors.is_empty(),
            total_blocks,
            errors,
        }
    }

    /// Errors of one kind only.
    pub fn errors_of(&self, kind: ChainErrorKind) -> impl Iterator<Item = &ChainError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

/// Number of blocks recorded under one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub total: u64,
}

/// Summary of the ledger's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatistics {
    pub total_blocks: u64,
    /// Sorted by `total` descending, ties broken by tag ascending.
    pub counts_by_type: Vec<TypeCount>,
    /// Rendered exactly as it is hashed.  `None` on an empty ledger.
    pub first_block_timestamp: Option<String>,
    pub last_block_timestamp: Option<String>,
    /// Result of a full verification at the time the statistics were taken.
    pub currently_valid: bool,
}
