//! Gate configuration schema.
//!
//! A `GateConfig` is deserialized from TOML.  It decides whether the
//! legacy transaction tags are still admitted and which payload schemas
//! apply to which transaction type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON Schema attached to one transaction type.
///
/// Example in TOML:
/// ```toml
/// [[schemas]]
/// type = "company-created"
/// description = "company snapshot"
/// schema = { type = "object", required = ["nit", "nombre"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRule {
    /// Canonical or legacy tag of the transaction type this schema governs.
    #[serde(rename = "type")]
    pub kind: String,

    /// Shown in rejection logs.
    #[serde(default)]
    pub description: String,

    /// The JSON Schema document, written inline as a TOML table.
    pub schema: Value,
}

/// The top-level structure deserialized from a gate TOML file.
///
/// An empty document is valid: canonical tags only, no schemas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Admit `empresa_creada`-style tags from older producers.
    #[serde(default)]
    pub accept_legacy_tags: bool,

    /// At most one schema per transaction type.
    #[serde(default)]
    pub schemas: Vec<SchemaRule>,
}
