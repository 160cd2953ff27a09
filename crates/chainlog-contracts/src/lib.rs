//! # chainlog-contracts
//!
//! Shared types, reports, and error contracts for the chainlog audit ledger.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod block;
pub mod error;
pub mod query;
pub mod report;

pub use block::{Block, TransactionType, GENESIS_HASH, SYSTEM_ACTOR};
pub use error::{LedgerError, LedgerResult};
pub use query::BlockFilter;
pub use report::{ChainError, ChainErrorKind, LedgerStatistics, TypeCount, VerificationReport};
