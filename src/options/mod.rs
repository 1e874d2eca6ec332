//! Runtime configuration with TOML support.
//!
//! Artifact source, storage layout, receptor registry, formulation datasets,
//! batch policy and viewer behavior are consolidated here. Options
//! serialize to/from TOML; every section uses `#[serde(default)]` so a
//! partial file (e.g. only overriding `[source]`) works.

mod source;
mod storage;
mod viewer;

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use source::{SourceKind, SourceOptions};
pub use storage::StorageOptions;
pub use viewer::{LabelOptions, ViewerOptions};

use crate::aggregate::FailurePolicy;
use crate::error::DockviewError;
use crate::resolve::{DatasetEntry, ReceptorEntry};

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct Options {
    /// What a failed fetch does to the rest of a docking batch.
    #[schemars(skip)]
    pub batch_failure_policy: FailurePolicy,
    /// Artifact retrieval settings.
    pub source: SourceOptions,
    /// Base paths per storage bucket.
    pub storage: StorageOptions,
    /// Scene loading and camera behavior.
    pub viewer: ViewerOptions,
    /// Receptor file → output prefix registry.
    pub receptors: Vec<ReceptorEntry>,
    /// Formulation datasets available for trajectory viewing.
    pub datasets: Vec<DatasetEntry>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            batch_failure_policy: FailurePolicy::AbortBatch,
            source: SourceOptions::default(),
            storage: StorageOptions::default(),
            viewer: ViewerOptions::default(),
            receptors: ReceptorEntry::defaults(),
            datasets: DatasetEntry::defaults(),
        }
    }
}

impl Options {
    /// Generate JSON Schema describing the options document.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, DockviewError> {
        let content = std::fs::read_to_string(path).map_err(DockviewError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, DockviewError> {
        toml::from_str(content)
            .map_err(|e| DockviewError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), DockviewError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DockviewError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DockviewError::Io)?;
        }
        std::fs::write(path, content).map_err(DockviewError::Io)
    }
}
