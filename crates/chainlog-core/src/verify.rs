//! The chain verifier.
//!
//! Walks a snapshot of the ledger in ascending order and checks two rules
//! for every block:
//!
//! 1. **Link**: `previous_hash` equals the stored `current_hash` of the
//!    block before it (`GENESIS_HASH` for the first block).
//! 2. **Content**: the stored `current_hash` equals the hash recomputed
//!    from the block's own `(type, payload, timestamp, previous_hash)`.
//!
//! Unlike a fail-fast check, every block is examined and every mismatch is
//! reported.  The two rules are evaluated independently, so one block can
//! carry both errors.  The expected link for block N+1 is what block N
//! *claims* as its hash, so editing only a payload is reported once, at
//! that block, and does not cascade.

use tracing::{debug, warn};

use chainlog_contracts::{
    Block, ChainError, ChainErrorKind, LedgerResult, VerificationReport, GENESIS_HASH,
};

use crate::hash::hash_block;
use crate::traits::LedgerStore;

/// Verify an ordered slice of blocks.  An empty chain is valid.
pub fn verify_chain(blocks: &[Block]) -> LedgerResult<VerificationReport> {
    let mut errors = Vec::new();
    let mut expected_previous = GENESIS_HASH.to_string();

    for block in blocks {
        // Rule 1: linkage against what the previous block claims.
        if block.previous_hash != expected_previous {
            warn!(
                block = block.sequence,
                expected = %expected_previous,
                found = %block.previous_hash,
                "previous hash mismatch"
            );
            errors.push(ChainError::new(
                block.sequence,
                ChainErrorKind::PreviousHashMismatch,
                expected_previous.clone(),
                block.previous_hash.clone(),
            ));
        }

        // Rule 2: recompute from stored fields.
        let recomputed = hash_block(block)?;
        if block.current_hash != recomputed {
            warn!(
                block = block.sequence,
                expected = %recomputed,
                found = %block.current_hash,
                "current hash mismatch"
            );
            errors.push(ChainError::new(
                block.sequence,
                ChainErrorKind::CurrentHashMismatch,
                recomputed,
                block.current_hash.clone(),
            ));
        }

        expected_previous = block.current_hash.clone();
    }

    debug!(
        total_blocks = blocks.len(),
        error_count = errors.len(),
        "chain verification complete"
    );

    Ok(VerificationReport::from_errors(blocks.len() as u64, errors))
}

/// Verify everything currently held by `store`.
pub fn verify_store(store: &dyn LedgerStore) -> LedgerResult<VerificationReport> {
    let blocks = store.list_ordered()?;
    verify_chain(&blocks)
}
