use rustc_hash::FxHashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::DockviewError;

/// Which artifact tree a receptor's outputs live in.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StorageBucket {
    /// Docking outputs (score tables, posed ligands, label anchors).
    #[default]
    Docking,
    /// Membrane interaction structures.
    Membrane,
    /// Formulation (micelle) trajectories.
    Formulation,
}

/// Structure file format of a receptor's docked outputs.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StructureFormat {
    /// Plain PDB.
    Pdb,
    /// AutoDock PDBQT.
    #[default]
    Pdbqt,
}

impl StructureFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdb => "pdb",
            Self::Pdbqt => "pdbqt",
        }
    }
}

/// Registry row: a receptor file and the prefix its outputs are named with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ReceptorEntry {
    /// Receptor file name as offered for selection.
    pub receptor: String,
    /// Prefix of every output artifact for this receptor.
    pub prefix: String,
    /// Artifact tree holding the outputs.
    #[serde(default)]
    pub bucket: StorageBucket,
    /// Format of the docked structure files.
    #[serde(default)]
    pub format: StructureFormat,
}

impl ReceptorEntry {
    /// Entry in the docking bucket with PDBQT outputs.
    #[must_use]
    pub fn docking(receptor: &str, prefix: &str) -> Self {
        Self {
            receptor: receptor.to_owned(),
            prefix: prefix.to_owned(),
            bucket: StorageBucket::Docking,
            format: StructureFormat::Pdbqt,
        }
    }

    /// The bioactivity receptors shipped with the artifact tree.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::docking("Anti-inflammation.pdbqt", "COX-2"),
            Self::docking("Anti-amylase.pdbqt", "Amylase"),
            Self::docking("Anti-glucosidase.pdbqt", "Glucosidase"),
            Self::docking("Anti-lipase.pdbqt", "Lipase"),
            Self::docking("Anti-carnosinase.pdbqt", "Carnosinase"),
        ]
    }
}

/// Lookup table from receptor file name to its registry entry.
#[derive(Debug, Clone, Default)]
pub struct ReceptorRegistry {
    entries: FxHashMap<String, ReceptorEntry>,
}

impl ReceptorRegistry {
    /// Build from entries. A later entry for the same receptor replaces an
    /// earlier one.
    #[must_use]
    pub fn from_entries(
        entries: impl IntoIterator<Item = ReceptorEntry>,
    ) -> Self {
        let mut map = FxHashMap::default();
        for entry in entries {
            let _ = map.insert(entry.receptor.clone(), entry);
        }
        Self { entries: map }
    }

    /// Look up a receptor by file name. Leading directories are ignored.
    pub fn lookup(
        &self,
        receptor: &str,
    ) -> Result<&ReceptorEntry, DockviewError> {
        let name = file_name(receptor);
        self.entries.get(name).ok_or_else(|| {
            DockviewError::Configuration(format!(
                "no prefix found for receptor {name}"
            ))
        })
    }

    /// Number of registered receptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no receptor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Formulation dataset row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct DatasetEntry {
    /// Selection key, e.g. `C8`.
    pub key: String,
    /// Display name.
    pub name: String,
}

impl DatasetEntry {
    /// The coconut-oil micelle datasets.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        ["C8", "C10", "C12"]
            .into_iter()
            .map(|k| Self {
                key: k.to_owned(),
                name: k.to_owned(),
            })
            .collect()
    }
}

/// Artifact locations of one formulation dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    /// Display name.
    pub name: String,
    /// Multiframe PDB (`MODEL`/`ENDMDL` per frame).
    pub multiframe: String,
    /// Per-frame metrics JSON.
    pub metrics: String,
}

/// Lookup table from dataset key to its entry.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    entries: FxHashMap<String, DatasetEntry>,
}

impl DatasetRegistry {
    /// Build from entries.
    #[must_use]
    pub fn from_entries(
        entries: impl IntoIterator<Item = DatasetEntry>,
    ) -> Self {
        let mut map = FxHashMap::default();
        for entry in entries {
            let _ = map.insert(entry.key.clone(), entry);
        }
        Self { entries: map }
    }

    /// Resolve a selection (`C8` or `C8.pdb`) to its artifact paths under
    /// `base`.
    pub fn resolve(
        &self,
        selection: &str,
        base: &str,
    ) -> Result<DatasetPaths, DockviewError> {
        let key = strip_structure_extension(file_name(selection));
        let entry = self.entries.get(key).ok_or_else(|| {
            DockviewError::Configuration(format!(
                "no micelle dataset configured for: {key}"
            ))
        })?;
        Ok(DatasetPaths {
            name: entry.name.clone(),
            multiframe: format!("{base}/{}_multiframe.pdb", entry.key),
            metrics: format!("{base}/{}_metrics.json", entry.key),
        })
    }
}

/// Last path component.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Drop a trailing `.pdbqt` or `.pdb` extension.
#[must_use]
pub fn strip_structure_extension(name: &str) -> &str {
    name.strip_suffix(".pdbqt")
        .or_else(|| name.strip_suffix(".pdb"))
        .unwrap_or(name)
}
