//! The request gate.
//!
//! `RecordGate` checks a `RecordRequest` before anything reaches the
//! recorder:
//!
//! 1. The type must be present and name a known transaction type.
//!    Legacy tags pass only when the config allows them.
//! 2. The payload must be a JSON object.
//! 3. If a schema is configured for the type, every violation is collected
//!    and the request is rejected with all of them at once.
//! 4. A missing or blank actor becomes `SYSTEM_ACTOR`.
//!
//! Every rejection is `LedgerError::MalformedInput` and happens before any
//! write.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use chainlog_contracts::{
    Block, LedgerError, LedgerResult, TransactionType, SYSTEM_ACTOR,
};
use chainlog_core::TransactionRecorder;

use crate::rule::GateConfig;

/// An inbound write as it arrives from an untrusted caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default = "empty_object")]
    pub payload: Value,
    #[serde(default)]
    pub actor: Option<String>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl RecordRequest {
    pub fn new(kind: impl Into<String>, payload: Value, actor: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            payload,
            actor: actor.map(str::to_string),
        }
    }
}

/// A request that passed every gate check, ready for the recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedRecord {
    /// The tag exactly as submitted; it becomes a hash input.
    pub kind: String,
    pub transaction_type: TransactionType,
    pub payload: Value,
    pub actor: String,
}

struct CompiledSchema {
    description: String,
    validator: jsonschema::Validator,
}

/// Validates inbound requests against a `GateConfig`.
///
/// ```rust,ignore
/// let gate = RecordGate::from_file(Path::new("config/gate.toml"))?;
/// let block = gate.submit(service.recorder(), request)?;
/// ```
pub struct RecordGate {
    accept_legacy_tags: bool,
    schemas: HashMap<TransactionType, CompiledSchema>,
}

impl RecordGate {
    /// Canonical tags only, no payload schemas.
    pub fn permissive() -> Self {
        Self {
            accept_legacy_tags: false,
            schemas: HashMap::new(),
        }
    }

    /// Compile every schema in `config`.
    ///
    /// Returns `LedgerError::ConfigError` for a schema naming an unknown
    /// type, two schemas for the same type, or a schema document that does
    /// not compile.
    pub fn from_config(config: GateConfig) -> LedgerResult<Self> {
        let mut schemas = HashMap::new();
        for rule in config.schemas {
            let ty: TransactionType = rule.kind.parse().map_err(|_| LedgerError::ConfigError {
                reason: format!("schema for unknown transaction type '{}'", rule.kind),
            })?;
            let validator =
                jsonschema::validator_for(&rule.schema).map_err(|e| LedgerError::ConfigError {
                    reason: format!("invalid JSON Schema for '{}': {}", rule.kind, e),
                })?;
            let compiled = CompiledSchema {
                description: rule.description,
                validator,
            };
            if schemas.insert(ty, compiled).is_some() {
                return Err(LedgerError::ConfigError {
                    reason: format!("more than one schema configured for '{}'", ty),
                });
            }
        }
        debug!(
            schemas = schemas.len(),
            accept_legacy_tags = config.accept_legacy_tags,
            "record gate configured"
        );
        Ok(Self {
            accept_legacy_tags: config.accept_legacy_tags,
            schemas,
        })
    }

    /// Parse `s` as gate TOML and build a `RecordGate`.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: GateConfig = toml::from_str(s).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to parse gate TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as gate TOML.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to read gate file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn accepts_legacy_tags(&self) -> bool {
        self.accept_legacy_tags
    }

    /// Run every check and return the normalized record.
    pub fn admit(&self, request: RecordRequest) -> LedgerResult<AdmittedRecord> {
        let RecordRequest {
            kind,
            payload,
            actor,
        } = request;

        let kind = kind.trim().to_string();
        if kind.is_empty() {
            return Err(reject(&kind, "type is required".to_string()));
        }

        let transaction_type = self.classify(&kind)?;

        if !payload.is_object() {
            return Err(reject(
                &kind,
                format!("payload must be a JSON object, got {}", json_kind(&payload)),
            ));
        }

        if let Some(compiled) = self.schemas.get(&transaction_type) {
            let violations: Vec<String> = compiled
                .validator
                .iter_errors(&payload)
                .map(|e| format!("at '{}': {}", e.instance_path, e))
                .collect();
            if !violations.is_empty() {
                warn!(
                    kind = %kind,
                    schema = %compiled.description,
                    violations = violations.len(),
                    "payload failed schema validation"
                );
                return Err(reject(
                    &kind,
                    format!("payload does not match schema: {}", violations.join("; ")),
                ));
            }
        }

        let actor = actor
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| SYSTEM_ACTOR.to_string());

        Ok(AdmittedRecord {
            kind,
            transaction_type,
            payload,
            actor,
        })
    }

    /// Admit `request` and hand it to `recorder`.
    pub fn submit(
        &self,
        recorder: &TransactionRecorder,
        request: RecordRequest,
    ) -> LedgerResult<Block> {
        let admitted = self.admit(request)?;
        recorder.record(&admitted.kind, &admitted.payload, &admitted.actor)
    }

    fn classify(&self, kind: &str) -> LedgerResult<TransactionType> {
        if let Some(ty) = TransactionType::from_canonical(kind) {
            return Ok(ty);
        }
        if let Some(ty) = TransactionType::from_legacy(kind) {
            if self.accept_legacy_tags {
                return Ok(ty);
            }
            return Err(reject(
                kind,
                format!("legacy tag '{}' is not accepted; use '{}'", kind, ty),
            ));
        }
        Err(reject(
            kind,
            format!(
                "unknown transaction type '{}'; valid types: {}",
                kind,
                TransactionType::canonical_tags().join(", ")
            ),
        ))
    }
}

impl Default for RecordGate {
    fn default() -> Self {
        Self::permissive()
    }
}

fn reject(kind: &str, reason: String) -> LedgerError {
    warn!(kind = %kind, %reason, "record request rejected");
    LedgerError::MalformedInput { reason }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
