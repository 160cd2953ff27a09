//! Durable `LedgerStore` backed by the sled embedded database.
//!
//! Layout: one tree, `blocks`, keyed by the big-endian sequence number so
//! that sled's key order is chain order.  Values are JSON-encoded `Block`s.
//!
//! sled locks the database directory against other processes, so a
//! process-local `RwLock` is enough to serialize writers: appends and
//! resets take it exclusively, reads take it shared so they observe whole
//! blocks from a single point in time.

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, error, info};

use chainlog_contracts::{Block, LedgerError, LedgerResult};
use chainlog_core::{next_block, LedgerStore};

const BLOCKS_TREE: &str = "blocks";

/// A persistent, append-only ledger store.
///
/// Cloning shares the open database and the writer lock.
#[derive(Clone)]
pub struct SledLedgerStore {
    db: sled::Db,
    pub(crate) blocks: sled::Tree,
    lock: Arc<RwLock<()>>,
    flush_on_append: bool,
}

impl SledLedgerStore {
    /// Open or create a ledger at `path`, flushing after every append.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        Self::open_with(path, true)
    }

    /// Open or create a ledger at `path`.
    ///
    /// With `flush_on_append = false` an append returns once sled has the
    /// block in its page cache; a crash may lose the most recent blocks
    /// (never a partial one).
    pub fn open_with<P: AsRef<Path>>(path: P, flush_on_append: bool) -> LedgerResult<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| LedgerError::Storage {
            reason: format!("failed to open sled db at '{}': {}", path.display(), e),
        })?;
        let blocks = db.open_tree(BLOCKS_TREE).map_err(|e| LedgerError::Storage {
            reason: format!("failed to open blocks tree: {}", e),
        })?;

        info!(path = %path.display(), blocks = blocks.len(), "opened sled ledger");

        Ok(Self {
            db,
            blocks,
            lock: Arc::new(RwLock::new(())),
            flush_on_append,
        })
    }

    /// Flush every pending write to disk.
    pub fn flush(&self) -> LedgerResult<()> {
        self.db.flush().map_err(|e| LedgerError::Storage {
            reason: format!("failed to flush db: {}", e),
        })?;
        Ok(())
    }

    // ==================== helpers ====================

    fn key(sequence: u64) -> [u8; 8] {
        sequence.to_be_bytes()
    }

    fn decode(key: &[u8], value: &[u8]) -> LedgerResult<Block> {
        let sequence = <[u8; 8]>::try_from(key)
            .map(u64::from_be_bytes)
            .map_err(|_| LedgerError::Storage {
                reason: format!("malformed block key of {} bytes", key.len()),
            })?;
        serde_json::from_slice(value).map_err(|e| LedgerError::CorruptRecord {
            sequence,
            reason: e.to_string(),
        })
    }

    fn read_guard(&self) -> LedgerResult<RwLockReadGuard<'_, ()>> {
        self.lock.read().map_err(|e| LedgerError::Storage {
            reason: format!("ledger lock poisoned: {}", e),
        })
    }

    fn write_guard(&self) -> LedgerResult<RwLockWriteGuard<'_, ()>> {
        self.lock.write().map_err(|e| LedgerError::Storage {
            reason: format!("ledger lock poisoned: {}", e),
        })
    }

    fn last_unlocked(&self) -> LedgerResult<Option<Block>> {
        let last = self.blocks.last().map_err(|e| LedgerError::Storage {
            reason: format!("failed to read last block: {}", e),
        })?;
        last.map(|(k, v)| Self::decode(&k, &v)).transpose()
    }
}

impl LedgerStore for SledLedgerStore {
    fn append(&self, kind: &str, payload: &Value, actor: &str) -> LedgerResult<Block> {
        let _writer = self.write_guard()?;

        let last = self.last_unlocked()?;
        let block = next_block(last.as_ref(), kind, payload, actor)?;
        let key = Self::key(block.sequence);
        let value = serde_json::to_vec(&block)?;

        self.blocks.insert(key, value).map_err(|e| LedgerError::Storage {
            reason: format!("failed to insert block {}: {}", block.sequence, e),
        })?;

        if self.flush_on_append {
            if let Err(e) = self.blocks.flush() {
                // Take the block back out so the caller's error is the truth.
                if let Err(undo) = self.blocks.remove(key) {
                    error!(sequence = block.sequence, error = %undo, "failed to roll back unflushed block");
                }
                return Err(LedgerError::Storage {
                    reason: format!("failed to flush block {}: {}", block.sequence, e),
                });
            }
        }

        debug!(sequence = block.sequence, "appended block to sled");
        Ok(block)
    }

    fn get_last(&self) -> LedgerResult<Option<Block>> {
        let _reader = self.read_guard()?;
        self.last_unlocked()
    }

    fn get(&self, sequence: u64) -> LedgerResult<Option<Block>> {
        let _reader = self.read_guard()?;
        let key = Self::key(sequence);
        let value = self.blocks.get(key).map_err(|e| LedgerError::Storage {
            reason: format!("failed to get block {}: {}", sequence, e),
        })?;
        value.map(|v| Self::decode(&key, &v)).transpose()
    }

    fn list_ordered(&self) -> LedgerResult<Vec<Block>> {
        let _reader = self.read_guard()?;
        let mut blocks = Vec::new();
        for item in self.blocks.iter() {
            let (k, v) = item.map_err(|e| LedgerError::Storage {
                reason: format!("failed to iterate blocks: {}", e),
            })?;
            blocks.push(Self::decode(&k, &v)?);
        }
        Ok(blocks)
    }

    fn count(&self) -> LedgerResult<u64> {
        let _reader = self.read_guard()?;
        Ok(self.blocks.len() as u64)
    }

    fn clear_all(&self) -> LedgerResult<u64> {
        let _writer = self.write_guard()?;
        let removed = self.blocks.len() as u64;
        self.blocks.clear().map_err(|e| LedgerError::Storage {
            reason: format!("failed to clear blocks: {}", e),
        })?;
        self.flush()?;
        Ok(removed)
    }
}
