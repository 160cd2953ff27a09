//! `chainlog.toml` loading.
//!
//! ```toml
//! log_filter = "info"
//!
//! [store]
//! backend = "sled"          # or "memory"
//! path = "data/chainlog"
//! flush_on_append = true
//!
//! [gate]
//! config = "config/gate.toml"
//! ```
//!
//! Every key is optional.  A missing default config file yields the
//! defaults; a config file named explicitly must exist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use chainlog_contracts::{LedgerError, LedgerResult};
use chainlog_core::LedgerStore;
use chainlog_gate::RecordGate;
use chainlog_store::{InMemoryLedgerStore, SledLedgerStore};

pub const DEFAULT_CONFIG_PATH: &str = "chainlog.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Backend,
    pub path: PathBuf,
    pub flush_on_append: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sled,
            path: PathBuf::from("data/chainlog"),
            flush_on_append: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSection {
    /// Gate TOML file.  Unset means canonical tags only and no schemas.
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub store: StoreConfig,
    pub gate: GateSection,
    /// Used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
}

impl CliConfig {
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        toml::from_str(s).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })
    }

    /// Load `explicit` if given, else `chainlog.toml` when it exists, else
    /// the defaults.
    pub fn load(explicit: Option<&Path>) -> LedgerResult<Self> {
        let path = match explicit {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn open_store(&self) -> LedgerResult<Arc<dyn LedgerStore>> {
        let store: Arc<dyn LedgerStore> = match self.store.backend {
            Backend::Sled => Arc::new(SledLedgerStore::open_with(
                &self.store.path,
                self.store.flush_on_append,
            )?),
            Backend::Memory => Arc::new(InMemoryLedgerStore::new()),
        };
        Ok(store)
    }

    pub fn gate(&self) -> LedgerResult<RecordGate> {
        match &self.gate.config {
            Some(path) => RecordGate::from_file(path),
            None => Ok(RecordGate::permissive()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
