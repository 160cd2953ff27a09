//! The storage seam of the ledger.
//!
//! `LedgerStore` is implemented by the backends in `chainlog-store`.  The
//! recorder and the reader facade only ever talk to this trait, so a new
//! backend needs nothing but an implementation of it.

use serde_json::Value;

use chainlog_contracts::{Block, LedgerResult};

/// An ordered, append-only sequence of hash-linked blocks.
///
/// # Serialization contract
///
/// `append` must be atomic with respect to every other `append` and to
/// `clear_all`: reading the tail, sealing the next block, and persisting it
/// happen as one step.  Two concurrent appends must never observe the same
/// tail.  Reads may run concurrently with appends but must only ever see
/// whole blocks.
pub trait LedgerStore: Send + Sync {
    /// Seal and persist the next block.
    ///
    /// Uses `chain::next_block` on the current tail.  Either the complete
    /// block is durably written and returned, or nothing is written and a
    /// `LedgerError::Storage` (or `Serialization`) is returned.
    fn append(&self, kind: &str, payload: &Value, actor: &str) -> LedgerResult<Block>;

    /// The block with the highest sequence number, if any.
    fn get_last(&self) -> LedgerResult<Option<Block>>;

    /// The block with the given sequence number, if any.
    fn get(&self, sequence: u64) -> LedgerResult<Option<Block>>;

    /// A snapshot of every block in ascending sequence order.
    fn list_ordered(&self) -> LedgerResult<Vec<Block>>;

    /// Number of stored blocks.
    fn count(&self) -> LedgerResult<u64>;

    /// Remove every block.  Returns how many were removed.
    ///
    /// Administrative recovery only.  The next append starts a new chain at
    /// sequence 1 with the genesis sentinel.
    fn clear_all(&self) -> LedgerResult<u64>;
}
