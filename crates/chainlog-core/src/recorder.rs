//! The transaction recorder: the single sanctioned way to add a block.
//!
//! Producers never build blocks themselves.  They hand the recorder a
//! `(type, payload, actor)` triple after their own mutation succeeded and
//! the store does the sequencing and hash linkage under its append lock.
//!
//! The actor is an explicit argument.  Whatever boundary owns the
//! authenticated identity passes it down; there is no ambient lookup.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use chainlog_contracts::{Block, LedgerResult, TransactionType};

use crate::traits::LedgerStore;

/// Facade over a `LedgerStore` for event producers.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct TransactionRecorder {
    store: Arc<dyn LedgerStore>,
}

impl TransactionRecorder {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Append one block describing a completed mutation.
    ///
    /// Any string is accepted as `kind`; rejecting unknown tags is the
    /// calling boundary's job.  A storage failure is logged at error level
    /// and returned unchanged: the caller decides whether it is fatal to
    /// the mutation that triggered it.
    pub fn record(&self, kind: &str, payload: &Value, actor: &str) -> LedgerResult<Block> {
        match self.store.append(kind, payload, actor) {
            Ok(block) => {
                info!(
                    sequence = block.sequence,
                    kind = %block.kind,
                    actor = %block.actor,
                    hash = %block.current_hash,
                    "transaction recorded"
                );
                Ok(block)
            }
            Err(e) => {
                error!(
                    kind,
                    actor,
                    error = %e,
                    "ledger append failed; mutation is NOT on the audit chain"
                );
                Err(e)
            }
        }
    }

    /// Typed variant of [`record`](Self::record) using the canonical tag.
    pub fn record_type(
        &self,
        kind: TransactionType,
        payload: &Value,
        actor: &str,
    ) -> LedgerResult<Block> {
        self.record(kind.as_str(), payload, actor)
    }
}
