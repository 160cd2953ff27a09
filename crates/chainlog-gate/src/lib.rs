//! # chainlog-gate
//!
//! The boundary in front of the transaction recorder.
//!
//! ## Overview
//!
//! [`RecordGate`] turns untrusted `(type, payload, actor)` requests into
//! records the recorder can append.  It enforces the closed set of
//! transaction types, requires object payloads, optionally validates each
//! type's payload against a JSON Schema, and fills in the system actor when
//! none is given.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use chainlog_gate::{RecordGate, RecordRequest};
//!
//! let gate = RecordGate::from_file(Path::new("config/gate.toml"))?;
//! let request: RecordRequest = serde_json::from_str(body)?;
//! let block = gate.submit(service.recorder(), request)?;
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! accept_legacy_tags = false
//!
//! [[schemas]]
//! type = "company-created"
//! description = "company snapshot"
//! schema = { type = "object", required = ["nit", "nombre"] }
//! ```

pub mod engine;
pub mod rule;

pub use engine::{AdmittedRecord, RecordGate, RecordRequest};
pub use rule::{GateConfig, SchemaRule};

// ── Tests ─────────────────────────────────────────────────────────────────────
