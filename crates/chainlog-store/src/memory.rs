//! In-memory implementation of `LedgerStore`.
//!
//! `InMemoryLedgerStore` keeps all blocks in a `Vec` behind an `RwLock`.
//! Appends take the write lock for the whole read-tail, seal, push step,
//! which is what serializes concurrent writers.  Readers share the read
//! lock and always see whole blocks.
//!
//! Nothing survives the process.  Use it for tests, demos, and embedding
//! where durability comes from elsewhere.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;

use chainlog_contracts::{Block, LedgerError, LedgerResult};
use chainlog_core::{next_block, LedgerStore};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryLedgerStore`.
pub(crate) struct InMemoryState {
    /// All blocks, in append order.  Index `i` holds sequence `i + 1`.
    pub(crate) blocks: Vec<Block>,
}

// ── Public store ──────────────────────────────────────────────────────────────

/// An in-memory, append-only ledger store.
///
/// Cloning shares the underlying chain.
#[derive(Clone)]
pub struct InMemoryLedgerStore {
    pub(crate) state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryState { blocks: Vec::new() })),
        }
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, InMemoryState>> {
        self.state.read().map_err(|e| LedgerError::Storage {
            reason: format!("ledger state lock poisoned: {}", e),
        })
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, InMemoryState>> {
        self.state.write().map_err(|e| LedgerError::Storage {
            reason: format!("ledger state lock poisoned: {}", e),
        })
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── LedgerStore impl ──────────────────────────────────────────────────────────

impl LedgerStore for InMemoryLedgerStore {
    fn append(&self, kind: &str, payload: &Value, actor: &str) -> LedgerResult<Block> {
        let mut state = self.write()?;
        let block = next_block(state.blocks.last(), kind, payload, actor)?;
        state.blocks.push(block.clone());
        debug!(sequence = block.sequence, "appended block in memory");
        Ok(block)
    }

    fn get_last(&self) -> LedgerResult<Option<Block>> {
        Ok(self.read()?.blocks.last().cloned())
    }

    fn get(&self, sequence: u64) -> LedgerResult<Option<Block>> {
        let state = self.read()?;
        let found = sequence
            .checked_sub(1)
            .and_then(|idx| state.blocks.get(idx as usize))
            .cloned();
        Ok(found)
    }

    fn list_ordered(&self) -> LedgerResult<Vec<Block>> {
        Ok(self.read()?.blocks.clone())
    }

    fn count(&self) -> LedgerResult<u64> {
        Ok(self.read()?.blocks.len() as u64)
    }

    fn clear_all(&self) -> LedgerResult<u64> {
        let mut state = self.write()?;
        let removed = state.blocks.len() as u64;
        state.blocks.clear();
        Ok(removed)
    }
}
