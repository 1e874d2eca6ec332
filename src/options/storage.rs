use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resolve::StorageBucket;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Storage", inline)]
#[serde(default)]
/// Base paths of the artifact trees, one per storage bucket.
pub struct StorageOptions {
    /// Docking outputs (`results/`, `outputs/`, `xyz/`).
    pub docking: String,
    /// Receptor structures shown behind the docked ligands.
    pub receptors: String,
    /// Membrane interaction protein structures.
    pub membrane: String,
    /// Formulation (micelle) trajectories and metrics.
    pub formulation: String,
}

impl StorageOptions {
    /// Base path for a bucket.
    #[must_use]
    pub fn base_for(&self, bucket: StorageBucket) -> &str {
        match bucket {
            StorageBucket::Docking => &self.docking,
            StorageBucket::Membrane => &self.membrane,
            StorageBucket::Formulation => &self.formulation,
        }
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            docking: "/tem04_out".into(),
            receptors: "/data01/receptors".into(),
            membrane: "/a3".into(),
            formulation: "/simatec101/a4".into(),
        }
    }
}
