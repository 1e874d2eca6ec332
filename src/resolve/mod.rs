//! Selection → artifact path mapping.
//!
//! Output artifacts are named `{prefix}_{ligand}[_{ligand}]` where the prefix
//! comes from a registry rather than the receptor's file name, because the
//! two do not always match (`Anti-inflammation.pdbqt` writes `COX-2_*`).
//! Everything here is pure: no I/O, identical input gives identical paths.
//!
//! ```text
//! {base}/results/{prefix}_{ligands}.txt        score table
//! {base}/outputs/{prefix}_{ligands}.{ext}      docked poses
//! {base}/xyz/{prefix}_{ligands}.txt            label anchor
//! ```

mod registry;

pub use registry::{
    file_name, strip_structure_extension, DatasetEntry, DatasetPaths,
    DatasetRegistry, ReceptorEntry, ReceptorRegistry, StorageBucket,
    StructureFormat,
};
use serde::{Deserialize, Serialize};

use crate::error::DockviewError;
use crate::options::{Options, StorageOptions};

/// Largest ligand group compared side by side.
pub const MAX_PAIRWISE_LIGANDS: usize = 2;

/// A user's receptor + ligand choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Receptor file name (e.g. `Anti-inflammation.pdbqt`).
    pub receptor: String,
    /// Ligand file names in selection order.
    pub ligands: Vec<String>,
}

impl Selection {
    /// Selection of `receptor` with `ligands`.
    pub fn new<S: Into<String>>(
        receptor: impl Into<String>,
        ligands: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            receptor: receptor.into(),
            ligands: ligands.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether more than one ligand is compared.
    #[must_use]
    pub fn is_multi_ligand(&self) -> bool {
        self.ligands.len() > 1
    }

    /// Reject selections that cannot trigger a docking run.
    pub fn validate(&self) -> Result<(), DockviewError> {
        if self.ligands.is_empty() {
            return Err(DockviewError::Configuration(format!(
                "selection for {} has no ligands",
                self.receptor
            )));
        }
        Ok(())
    }

    /// [`Selection::validate`] plus the pairwise-comparison limit.
    pub fn validate_pairwise(&self) -> Result<(), DockviewError> {
        self.validate()?;
        if self.ligands.len() > MAX_PAIRWISE_LIGANDS {
            return Err(DockviewError::Configuration(format!(
                "at most {MAX_PAIRWISE_LIGANDS} ligands can be compared, \
                 got {}",
                self.ligands.len()
            )));
        }
        Ok(())
    }

    /// Human-readable ligand label, names joined by ` & `.
    #[must_use]
    pub fn ligand_label(&self) -> String {
        ligand_label(&self.ligands)
    }
}

/// Paths of one docking run's artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Comma-delimited pose/affinity table.
    pub score_table: String,
    /// Multi-model docked structure.
    pub structure: String,
    /// Optional `x,y,z` label anchor.
    pub label_anchor: Option<String>,
}

/// Sibling artifacts of a docked structure, derived from its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionPaths {
    /// `xyz/` label anchor file.
    pub label_anchor: String,
    /// `results/` score table.
    pub score_table: String,
}

/// Maps selections to artifact paths using the receptor registry.
#[derive(Debug, Clone)]
pub struct PathResolver {
    registry: ReceptorRegistry,
    datasets: DatasetRegistry,
    storage: StorageOptions,
}

impl PathResolver {
    /// Resolver over an explicit registry and storage layout.
    #[must_use]
    pub fn new(
        registry: ReceptorRegistry,
        datasets: DatasetRegistry,
        storage: StorageOptions,
    ) -> Self {
        Self {
            registry,
            datasets,
            storage,
        }
    }

    /// Resolver configured from options.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        Self::new(
            ReceptorRegistry::from_entries(options.receptors.iter().cloned()),
            DatasetRegistry::from_entries(options.datasets.iter().cloned()),
            options.storage.clone(),
        )
    }

    /// The receptor registry.
    #[must_use]
    pub fn registry(&self) -> &ReceptorRegistry {
        &self.registry
    }

    /// One artifact set per ligand, in selection order.
    pub fn resolve(
        &self,
        selection: &Selection,
    ) -> Result<Vec<ArtifactPaths>, DockviewError> {
        selection.validate()?;
        let entry = self.registry.lookup(&selection.receptor)?;
        Ok(selection
            .ligands
            .iter()
            .map(|ligand| self.paths_for(entry, std::slice::from_ref(ligand)))
            .collect())
    }

    /// One artifact set for the joint complex of every selected ligand.
    pub fn resolve_joint(
        &self,
        selection: &Selection,
    ) -> Result<ArtifactPaths, DockviewError> {
        selection.validate()?;
        let entry = self.registry.lookup(&selection.receptor)?;
        Ok(self.paths_for(entry, &selection.ligands))
    }

    fn paths_for(
        &self,
        entry: &ReceptorEntry,
        ligands: &[String],
    ) -> ArtifactPaths {
        let base = self.storage.base_for(entry.bucket);
        let stem = artifact_stem(&entry.prefix, ligands);
        ArtifactPaths {
            score_table: format!("{base}/results/{stem}.txt"),
            structure: format!(
                "{base}/outputs/{stem}.{}",
                entry.format.extension()
            ),
            label_anchor: Some(format!("{base}/xyz/{stem}.txt")),
        }
    }

    /// Path of the receptor structure itself.
    #[must_use]
    pub fn receptor_path(&self, receptor: &str) -> String {
        format!("{}/{}", self.storage.receptors, file_name(receptor))
    }

    /// Paths of a membrane-interaction protein set, in selection order.
    #[must_use]
    pub fn membrane_paths(&self, proteins: &[String]) -> Vec<String> {
        let base = self.storage.base_for(StorageBucket::Membrane);
        proteins
            .iter()
            .map(|p| format!("{base}/{}", file_name(p)))
            .collect()
    }

    /// Artifact paths of a formulation dataset.
    pub fn dataset(
        &self,
        selection: &str,
    ) -> Result<DatasetPaths, DockviewError> {
        let base = self.storage.base_for(StorageBucket::Formulation);
        self.datasets.resolve(selection, base)
    }
}

/// `{prefix}_{ligand}[_{ligand}...]` with structure extensions removed.
#[must_use]
pub fn artifact_stem(prefix: &str, ligands: &[String]) -> String {
    let mut stem = prefix.to_owned();
    for ligand in ligands {
        stem.push('_');
        stem.push_str(strip_structure_extension(file_name(ligand)));
    }
    stem
}

/// Ligand display label, names joined by ` & `.
#[must_use]
pub fn ligand_label(ligands: &[String]) -> String {
    ligands
        .iter()
        .map(|l| strip_structure_extension(file_name(l)))
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Receptor display name (file name without extension).
#[must_use]
pub fn receptor_display_name(receptor: &str) -> &str {
    strip_structure_extension(file_name(receptor))
}

/// Ligand name shown on a docked structure's label: the last `_` component
/// of the file stem (`COX-2_Curcumin.pdbqt` → `Curcumin`).
#[must_use]
pub fn structure_label(structure_path: &str) -> &str {
    let stem = strip_structure_extension(file_name(structure_path));
    stem.rsplit('_').next().unwrap_or(stem)
}

/// Derive the `xyz/` and `results/` siblings of a docked structure path.
///
/// `None` for structures outside an `outputs/` directory, which have no
/// siblings.
#[must_use]
pub fn companions(structure_path: &str) -> Option<CompanionPaths> {
    let (root, rest) = structure_path.split_once("/outputs/")?;
    let stem = strip_structure_extension(rest);
    Some(CompanionPaths {
        label_anchor: format!("{root}/xyz/{stem}.txt"),
        score_table: format!("{root}/results/{stem}.txt"),
    })
}
