//! Ledger blocks and the closed set of transaction types.
//!
//! A `Block` is one immutable entry in the ledger.  It records a single
//! mutation reported by an event producer: what kind of mutation happened,
//! a denormalized snapshot of the entity, who triggered it, and the two
//! hashes that link it into the chain.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// The `previous_hash` carried by the first block of every chain.
///
/// 64 hex zeros.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Actor recorded when no authenticated identity is available.
pub const SYSTEM_ACTOR: &str = "system";

/// A single entry in the hash-chained ledger.
///
/// Blocks are created exactly once by a ledger store's `append` and never
/// modified afterwards.  The `current_hash` commits to
/// `(kind, payload, timestamp, previous_hash)`; `sequence` and `actor` are
/// stored alongside but are not hash inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain.  Starts at 1, contiguous, strictly increasing.
    pub sequence: u64,

    /// Transaction tag exactly as recorded, e.g. `"company-created"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Snapshot of the mutated entity.  Opaque to the ledger.
    pub payload: serde_json::Value,

    /// Frozen at microsecond precision before the hash is computed.
    pub timestamp: DateTime<Utc>,

    /// `current_hash` of the preceding block, or `GENESIS_HASH`.
    pub previous_hash: String,

    /// Lowercase hex SHA-256 over the block's hash inputs.
    pub current_hash: String,

    /// Identity that triggered the mutation, or `SYSTEM_ACTOR`.
    pub actor: String,
}

impl Block {
    /// Returns true if this block opens a chain.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == GENESIS_HASH
    }

    /// Classify the recorded tag.  `None` for tags outside the known set.
    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.kind.parse().ok()
    }
}

/// The mutations the ledger knows how to describe.
///
/// The set is closed: new kinds are added as new variants, existing tags
/// never change because they are hash inputs of already-written blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    CompanyCreated,
    CompanyModified,
    CompanyDeleted,
    ProductCreated,
    ProductModified,
    ProductDeleted,
    InventoryUpdated,
    InventoryDeleted,
    UserCreated,
    UserDeleted,
}

impl TransactionType {
    /// Every variant, in declaration order.
    pub const ALL: [TransactionType; 10] = [
        TransactionType::CompanyCreated,
        TransactionType::CompanyModified,
        TransactionType::CompanyDeleted,
        TransactionType::ProductCreated,
        TransactionType::ProductModified,
        TransactionType::ProductDeleted,
        TransactionType::InventoryUpdated,
        TransactionType::InventoryDeleted,
        TransactionType::UserCreated,
        TransactionType::UserDeleted,
    ];

    /// The canonical tag written into new blocks.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CompanyCreated => "company-created",
            TransactionType::CompanyModified => "company-modified",
            TransactionType::CompanyDeleted => "company-deleted",
            TransactionType::ProductCreated => "product-created",
            TransactionType::ProductModified => "product-modified",
            TransactionType::ProductDeleted => "product-deleted",
            TransactionType::InventoryUpdated => "inventory-updated",
            TransactionType::InventoryDeleted => "inventory-deleted",
            TransactionType::UserCreated => "user-created",
            TransactionType::UserDeleted => "user-deleted",
        }
    }

    /// The tag used by ledgers written before the kebab-case tags existed.
    pub fn legacy_tag(&self) -> &'static str {
        match self {
            TransactionType::CompanyCreated => "empresa_creada",
            TransactionType::CompanyModified => "empresa_modificada",
            TransactionType::CompanyDeleted => "empresa_eliminada",
            TransactionType::ProductCreated => "producto_creado",
            TransactionType::ProductModified => "producto_modificado",
            TransactionType::ProductDeleted => "producto_eliminado",
            TransactionType::InventoryUpdated => "inventario_actualizado",
            TransactionType::InventoryDeleted => "inventario_eliminado",
            TransactionType::UserCreated => "usuario_creado",
            TransactionType::UserDeleted => "usuario_eliminado",
        }
    }

    /// Parse only the canonical tag.
    pub fn from_canonical(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Parse only the legacy tag.
    pub fn from_legacy(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.legacy_tag() == tag)
    }

    /// All canonical tags, for error messages and help output.
    pub fn canonical_tags() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.as_str()).collect()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    /// Accepts both canonical and legacy tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_canonical(s)
            .or_else(|| Self::from_legacy(s))
            .ok_or_else(|| LedgerError::MalformedInput {
                reason: format!(
                    "unknown transaction type '{}'; valid types: {}",
                    s,
                    Self::canonical_tags().join(", ")
                ),
            })
    }
}
