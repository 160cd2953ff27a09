//! Read-side filtering for block listings.
//!
//! `BlockFilter` is applied by the reader facade after it has taken an
//! ordered snapshot of the ledger.  All criteria are optional and combine
//! with AND.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::Block;

/// Criteria and pagination for listing blocks.
///
/// The default filter matches every block, oldest first, unpaginated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockFilter {
    /// Exact transaction tag.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Case-insensitive substring of the actor.
    pub actor: Option<String>,
    /// Inclusive lower bound on the block timestamp.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the block timestamp.
    pub until: Option<DateTime<Utc>>,
    /// Prefix of `current_hash` (lowercase hex).
    pub hash_prefix: Option<String>,
    /// List the most recent block first.
    #[serde(default)]
    pub newest_first: bool,
    /// Blocks to skip after filtering and ordering.
    #[serde(default)]
    pub offset: usize,
    /// Maximum number of blocks returned.
    pub limit: Option<usize>,
}

impl BlockFilter {
    /// Return true if `block` satisfies every criterion (pagination aside).
    pub fn matches(&self, block: &Block) -> bool {
        if let Some(kind) = &self.kind {
            if &block.kind != kind {
                return false;
            }
        }
        if let Some(actor) = &self.actor {
            if !block.actor.to_lowercase().contains(&actor.to_lowercase()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if block.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if block.timestamp > until {
                return false;
            }
        }
        if let Some(prefix) = &self.hash_prefix {
            if !block.current_hash.starts_with(&prefix.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// Filter, order, and paginate an ascending snapshot of blocks.
    pub fn apply(&self, blocks: Vec<Block>) -> Vec<Block> {
        let mut selected: Vec<Block> = blocks.into_iter().filter(|b| self.matches(b)).collect();
        if self.newest_first {
            selected.reverse();
        }
        let page = selected.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        }
    }
}
