//! The reader facade over a ledger store.
//!
//! `LedgerService` is what reporting code and operator tooling hold.  It
//! hands out the recorder for writes and answers every read question the
//! ledger supports: listing, single-block lookup, verification, statistics,
//! and the administrative reset.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use chainlog_contracts::{
    Block, BlockFilter, LedgerResult, LedgerStatistics, TypeCount, VerificationReport,
};

use crate::hash::format_timestamp;
use crate::recorder::TransactionRecorder;
use crate::traits::LedgerStore;
use crate::verify::{verify_chain, verify_store};

/// Bundles a store with its recorder and the read-side operations.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    recorder: TransactionRecorder,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        let recorder = TransactionRecorder::new(Arc::clone(&store));
        Self { store, recorder }
    }

    /// The write entry point to hand to event producers.
    pub fn recorder(&self) -> &TransactionRecorder {
        &self.recorder
    }

    /// Filtered, ordered, paginated listing over one snapshot.
    pub fn list(&self, filter: &BlockFilter) -> LedgerResult<Vec<Block>> {
        Ok(filter.apply(self.store.list_ordered()?))
    }

    pub fn get(&self, sequence: u64) -> LedgerResult<Option<Block>> {
        self.store.get(sequence)
    }

    pub fn count(&self) -> LedgerResult<u64> {
        self.store.count()
    }

    /// Verify the whole chain.  Corruption is reported, not raised.
    pub fn verify(&self) -> LedgerResult<VerificationReport> {
        let report = verify_store(self.store.as_ref())?;
        if !report.valid {
            warn!(
                total_blocks = report.total_blocks,
                error_count = report.errors.len(),
                "ledger failed integrity verification"
            );
        }
        Ok(report)
    }

    /// Totals, per-type counts, time span, and current validity, all taken
    /// from the same snapshot.
    pub fn statistics(&self) -> LedgerResult<LedgerStatistics> {
        let blocks = self.store.list_ordered()?;

        let mut by_type: BTreeMap<&str, u64> = BTreeMap::new();
        for block in &blocks {
            *by_type.entry(block.kind.as_str()).or_default() += 1;
        }
        let mut counts_by_type: Vec<TypeCount> = by_type
            .into_iter()
            .map(|(kind, total)| TypeCount {
                kind: kind.to_string(),
                total,
            })
            .collect();
        // BTreeMap order already breaks ties by tag; the sort is stable.
        counts_by_type.sort_by(|a, b| b.total.cmp(&a.total));

        let report = verify_chain(&blocks)?;

        Ok(LedgerStatistics {
            total_blocks: blocks.len() as u64,
            counts_by_type,
            first_block_timestamp: blocks.first().map(|b| format_timestamp(&b.timestamp)),
            last_block_timestamp: blocks.last().map(|b| format_timestamp(&b.timestamp)),
            currently_valid: report.valid,
        })
    }

    /// Delete the entire chain.  Returns the number of blocks removed.
    ///
    /// Gate this behind elevated privilege in whatever calls it.
    pub fn reset(&self) -> LedgerResult<u64> {
        let removed = self.store.clear_all()?;
        info!(removed, "ledger reset; next block starts a new chain");
        Ok(removed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use chainlog_contracts::{
        Block, BlockFilter, LedgerError, LedgerResult, TransactionType, GENESIS_HASH,
    };

    use crate::chain::next_block;
    use crate::hash::hash_block;
    use crate::traits::LedgerStore;

    use super::LedgerService;

    // ── Mock stores ──────────────────────────────────────────────────────────

    /// Minimal store used to exercise the facade in isolation.
    #[derive(Default)]
    struct VecStore {
        blocks: Mutex<Vec<Block>>,
    }

    impl LedgerStore for VecStore {
        fn append(&self, kind: &str, payload: &Value, actor: &str) -> LedgerResult<Block> {
            let mut blocks = self.blocks.lock().unwrap();
            let block = next_block(blocks.last(), kind, payload, actor)?;
            blocks.push(block.clone());
            Ok(block)
        }

        fn get_last(&self) -> LedgerResult<Option<Block>> {
            Ok(self.blocks.lock().unwrap().last().cloned())
        }

        fn get(&self, sequence: u64) -> LedgerResult<Option<Block>> {
            Ok(self
                .blocks
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.sequence == sequence)
                .cloned())
        }

        fn list_ordered(&self) -> LedgerResult<Vec<Block>> {
            Ok(self.blocks.lock().unwrap().clone())
        }

        fn count(&self) -> LedgerResult<u64> {
            Ok(self.blocks.lock().unwrap().len() as u64)
        }

        fn clear_all(&self) -> LedgerResult<u64> {
            let mut blocks = self.blocks.lock().unwrap();
            let removed = blocks.len() as u64;
            blocks.clear();
            Ok(removed)
        }
    }

    /// A store whose backing medium is gone.
    struct UnavailableStore;

    impl UnavailableStore {
        fn err<T>() -> LedgerResult<T> {
            Err(LedgerError::Storage {
                reason: "database unavailable".to_string(),
            })
        }
    }

    impl LedgerStore for UnavailableStore {
        fn append(&self, _: &str, _: &Value, _: &str) -> LedgerResult<Block> {
            Self::err()
        }
        fn get_last(&self) -> LedgerResult<Option<Block>> {
            Self::err()
        }
        fn get(&self, _: u64) -> LedgerResult<Option<Block>> {
            Self::err()
        }
        fn list_ordered(&self) -> LedgerResult<Vec<Block>> {
            Self::err()
        }
        fn count(&self) -> LedgerResult<u64> {
            Self::err()
        }
        fn clear_all(&self) -> LedgerResult<u64> {
            Self::err()
        }
    }

    fn service() -> (LedgerService, Arc<VecStore>) {
        let store = Arc::new(VecStore::default());
        (LedgerService::new(store.clone()), store)
    }

    // ── Recorder ─────────────────────────────────────────────────────────────

    #[test]
    fn first_record_is_genesis_with_correct_hash() {
        let (svc, _) = service();
        let block = svc
            .recorder()
            .record(
                "company-created",
                &json!({ "nit": "900123456", "nombre": "Acme" }),
                "admin@x.com",
            )
            .unwrap();

        assert_eq!(block.sequence, 1);
        assert_eq!(block.previous_hash, GENESIS_HASH);
        assert_eq!(block.current_hash, hash_block(&block).unwrap());
        assert_eq!(block.actor, "admin@x.com");

        let report = svc.verify().unwrap();
        assert!(report.valid);
        assert_eq!(report.total_blocks, 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn recorder_accepts_unknown_tags() {
        let (svc, _) = service();
        let block = svc.recorder().record("not-a-real-tag", &json!({}), "system").unwrap();
        assert_eq!(block.kind, "not-a-real-tag");
        assert_eq!(block.transaction_type(), None);
    }

    #[test]
    fn record_type_uses_canonical_tag() {
        let (svc, _) = service();
        let block = svc
            .recorder()
            .record_type(TransactionType::UserDeleted, &json!({ "email": "a@x.com" }), "system")
            .unwrap();
        assert_eq!(block.kind, "user-deleted");
    }

    #[test]
    fn storage_failure_propagates_from_recorder() {
        let svc = LedgerService::new(Arc::new(UnavailableStore));
        let err = svc
            .recorder()
            .record("company-created", &json!({}), "system")
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage { .. }));
        assert!(svc.verify().is_err());
        assert!(svc.statistics().is_err());
    }

    // ── Readers ──────────────────────────────────────────────────────────────

    #[test]
    fn statistics_over_three_types() {
        let (svc, _) = service();
        let rec = svc.recorder();
        rec.record("company-created", &json!({ "nit": "1" }), "a").unwrap();
        rec.record("product-created", &json!({ "id": 1 }), "a").unwrap();
        rec.record("company-created", &json!({ "nit": "2" }), "b").unwrap();
        rec.record("user-created", &json!({ "email": "x" }), "b").unwrap();

        let stats = svc.statistics().unwrap();
        assert_eq!(stats.total_blocks, 4);
        assert_eq!(stats.counts_by_type.iter().map(|c| c.total).sum::<u64>(), 4);
        assert_eq!(stats.counts_by_type[0].kind, "company-created");
        assert_eq!(stats.counts_by_type[0].total, 2);
        // Ties ordered by tag.
        assert_eq!(stats.counts_by_type[1].kind, "product-created");
        assert_eq!(stats.counts_by_type[2].kind, "user-created");
        assert!(stats.first_block_timestamp.is_some());
        assert!(stats.last_block_timestamp.is_some());
        assert!(stats.currently_valid);
    }

    #[test]
    fn statistics_on_empty_ledger() {
        let (svc, _) = service();
        let stats = svc.statistics().unwrap();
        assert_eq!(stats.total_blocks, 0);
        assert!(stats.counts_by_type.is_empty());
        assert_eq!(stats.first_block_timestamp, None);
        assert_eq!(stats.last_block_timestamp, None);
        assert!(stats.currently_valid);
    }

    #[test]
    fn statistics_report_tampering() {
        let (svc, store) = service();
        svc.recorder().record("company-created", &json!({ "nit": "1" }), "a").unwrap();
        store.blocks.lock().unwrap()[0].payload = json!({ "nit": "666" });

        assert!(!svc.statistics().unwrap().currently_valid);
    }

    #[test]
    fn list_applies_filter_and_get_finds_block() {
        let (svc, _) = service();
        let rec = svc.recorder();
        rec.record("company-created", &json!({}), "a").unwrap();
        rec.record("product-created", &json!({}), "a").unwrap();
        rec.record("company-modified", &json!({}), "a").unwrap();

        let filter = BlockFilter {
            newest_first: true,
            ..Default::default()
        };
        let seqs: Vec<u64> = svc.list(&filter).unwrap().iter().map(|b| b.sequence).collect();
        assert_eq!(seqs, vec![3, 2, 1]);

        assert_eq!(svc.get(2).unwrap().unwrap().kind, "product-created");
        assert!(svc.get(9).unwrap().is_none());
    }

    #[test]
    fn reset_empties_and_restarts_at_genesis() {
        let (svc, _) = service();
        for i in 0..5 {
            svc.recorder().record("inventory-updated", &json!({ "id": i }), "a").unwrap();
        }

        assert_eq!(svc.reset().unwrap(), 5);
        assert_eq!(svc.count().unwrap(), 0);

        let fresh = svc.recorder().record("inventory-updated", &json!({}), "a").unwrap();
        assert_eq!(fresh.sequence, 1);
        assert_eq!(fresh.previous_hash, GENESIS_HASH);
    }
}
