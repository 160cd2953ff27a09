//! # chainlog-store
//!
//! Append-only ledger stores implementing `chainlog_core::LedgerStore`.
//!
//! ## Overview
//!
//! - [`InMemoryLedgerStore`] keeps the chain in a `Vec`.  Fast, volatile.
//! - [`SledLedgerStore`] persists the chain in a sled database directory.
//!
//! Both seal blocks with `chainlog_core::next_block` while holding their
//! writer lock, so concurrent appends always form one strictly ordered,
//! hash-linked sequence.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chainlog_core::LedgerService;
//! use chainlog_store::SledLedgerStore;
//!
//! let service = LedgerService::new(Arc::new(SledLedgerStore::open("data/ledger")?));
//! service.recorder().record("company-created", &payload, "admin@x.com")?;
//! ```

pub mod memory;
pub mod sled;

pub use self::memory::InMemoryLedgerStore;
pub use self::sled::SledLedgerStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
