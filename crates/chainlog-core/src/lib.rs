//! # chainlog-core
//!
//! The hash-chained ledger core.
//!
//! This crate provides:
//! - The hash engine (`hash`) with its canonical payload encoding
//! - Block sealing (`chain`) used by every store inside its append lock
//! - The chain verifier (`verify`)
//! - The `LedgerStore` trait that storage backends implement
//! - `TransactionRecorder`, the only sanctioned write entry point
//! - `LedgerService`, the reader facade (list, verify, statistics, reset)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chainlog_core::LedgerService;
//!
//! let service = LedgerService::new(store);
//! service.recorder().record("company-created", &payload, "admin@x.com")?;
//! assert!(service.verify()?.valid);
//! ```

pub mod chain;
pub mod hash;
pub mod recorder;
pub mod service;
pub mod traits;
pub mod verify;

pub use chain::{next_block, seal_block};
pub use hash::{canonical_json, compute_hash, format_timestamp, hash_block};
pub use recorder::TransactionRecorder;
pub use service::LedgerService;
pub use traits::LedgerStore;
pub use verify::{verify_chain, verify_store};
