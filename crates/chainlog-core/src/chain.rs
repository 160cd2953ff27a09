//! Block sealing: turning a `(type, payload, actor)` triple into the next
//! fully-formed block of a chain.
//!
//! Stores call [`next_block`] inside their append critical section, with
//! the block they currently hold as the tail.  The timestamp is frozen
//! before the hash is computed and the same value is stored, so a sealed
//! block always re-verifies.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use chainlog_contracts::{Block, LedgerResult, GENESIS_HASH};

use crate::hash::{compute_hash, format_timestamp, frozen_now};

/// Seal the block that follows `last` (or a genesis block when `None`),
/// stamped with the current time.
pub fn next_block(
    last: Option<&Block>,
    kind: &str,
    payload: &Value,
    actor: &str,
) -> LedgerResult<Block> {
    seal_block(last, kind, payload, actor, frozen_now())
}

/// Seal the block that follows `last` with an explicit timestamp.
///
/// `timestamp` is stored as given; pass a value with at most microsecond
/// precision or the stored block will not re-verify.
pub fn seal_block(
    last: Option<&Block>,
    kind: &str,
    payload: &Value,
    actor: &str,
    timestamp: DateTime<Utc>,
) -> LedgerResult<Block> {
    let (sequence, previous_hash) = match last {
        Some(tail) => (tail.sequence + 1, tail.current_hash.clone()),
        None => (1, GENESIS_HASH.to_string()),
    };

    let current_hash = compute_hash(kind, payload, &format_timestamp(&timestamp), &previous_hash)?;

    debug!(sequence, kind, hash = %current_hash, "sealed block");

    Ok(Block {
        sequence,
        kind: kind.to_string(),
        payload: payload.clone(),
        timestamp,
        previous_hash,
        current_hash,
        actor: actor.to_string(),
    })
}
