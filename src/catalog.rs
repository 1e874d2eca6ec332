//! Category mapping document and the selection rules built on it.
//!
//! ```json
//! {
//!   "A.Anti-inflammation": {
//!     "protein": "Anti-inflammation.pdbqt",
//!     "ligands": ["Curcumin.pdbqt", "Oryzanol.pdbqt"]
//!   }
//! }
//! ```
//!
//! `protein` is either one file name or a list of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DockviewError;
use crate::resolve::{Selection, MAX_PAIRWISE_LIGANDS};

/// Where the mapping document lives in the artifact tree.
pub const DEFAULT_CATALOG_PATH: &str = "/mapping_contnet.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum Proteins {
    One(String),
    Many(Vec<String>),
}

impl Proteins {
    fn as_slice(&self) -> &[String] {
        match self {
            Self::One(p) => std::slice::from_ref(p),
            Self::Many(ps) => ps,
        }
    }
}

/// One bioactivity category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    protein: Proteins,
    /// Ligands offered in this category.
    #[serde(default)]
    pub ligands: Vec<String>,
}

impl Category {
    /// Receptors offered in this category.
    #[must_use]
    pub fn proteins(&self) -> &[String] {
        self.protein.as_slice()
    }
}

/// Category name → receptors and ligands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: BTreeMap<String, Category>,
}

impl Catalog {
    /// Parse the mapping document.
    pub fn from_json(text: &str) -> Result<Self, DockviewError> {
        serde_json::from_str(text)
            .map_err(|e| DockviewError::Catalog(e.to_string()))
    }

    /// Category names, sorted.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// A category by name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Receptors of a category (empty for an unknown category).
    #[must_use]
    pub fn proteins(&self, category: &str) -> &[String] {
        self.category(category)
            .map(Category::proteins)
            .unwrap_or_default()
    }

    /// Ligands of a category (empty for an unknown category).
    #[must_use]
    pub fn ligands(&self, category: &str) -> &[String] {
        self.category(category)
            .map(|c| c.ligands.as_slice())
            .unwrap_or_default()
    }

    fn require(&self, category: &str) -> Result<&Category, DockviewError> {
        self.category(category).ok_or_else(|| {
            DockviewError::Catalog(format!("unknown category {category}"))
        })
    }
}

/// A selection being assembled against a catalog.
///
/// One receptor at a time; ligands only from the receptor's category and at
/// most [`MAX_PAIRWISE_LIGANDS`] of them.
#[derive(Debug, Clone)]
pub struct SelectionDraft<'c> {
    catalog: &'c Catalog,
    receptor: Option<(String, String)>,
    ligands: BTreeMap<String, Vec<String>>,
}

impl<'c> SelectionDraft<'c> {
    /// Empty draft.
    #[must_use]
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            receptor: None,
            ligands: BTreeMap::new(),
        }
    }

    /// Selected `(category, receptor)`.
    #[must_use]
    pub fn receptor(&self) -> Option<(&str, &str)> {
        self.receptor
            .as_ref()
            .map(|(c, p)| (c.as_str(), p.as_str()))
    }

    /// Ligands selected in `category`, in selection order.
    #[must_use]
    pub fn ligands(&self, category: &str) -> &[String] {
        self.ligands
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Select a receptor, or deselect it if it is already selected.
    ///
    /// Selecting drops ligand picks of every other category; deselecting
    /// drops the category's own picks. Returns whether the receptor is now
    /// selected.
    pub fn toggle_receptor(
        &mut self,
        category: &str,
        protein: &str,
    ) -> Result<bool, DockviewError> {
        let offered = self.catalog.require(category)?.proteins();
        if !offered.iter().any(|p| p == protein) {
            return Err(DockviewError::Catalog(format!(
                "{protein} is not offered in {category}"
            )));
        }

        if self.receptor() == Some((category, protein)) {
            self.receptor = None;
            let _ = self.ligands.remove(category);
            return Ok(false);
        }

        self.ligands.retain(|c, _| c == category);
        self.receptor = Some((category.to_owned(), protein.to_owned()));
        Ok(true)
    }

    /// Add or remove a ligand. Returns whether it is now selected.
    ///
    /// Ligands can only be picked in the selected receptor's category. A
    /// third pick is ignored and leaves the selection unchanged.
    pub fn toggle_ligand(
        &mut self,
        category: &str,
        ligand: &str,
    ) -> Result<bool, DockviewError> {
        let offered = &self.catalog.require(category)?.ligands;
        if !offered.iter().any(|l| l == ligand) {
            return Err(DockviewError::Catalog(format!(
                "{ligand} is not offered in {category}"
            )));
        }
        if self.receptor().map(|(c, _)| c) != Some(category) {
            return Err(DockviewError::Configuration(format!(
                "select a receptor in {category} before its ligands"
            )));
        }

        let picks = self.ligands.entry(category.to_owned()).or_default();
        if let Some(i) = picks.iter().position(|l| l == ligand) {
            let _ = picks.remove(i);
            return Ok(false);
        }
        if picks.len() >= MAX_PAIRWISE_LIGANDS {
            log::debug!(
                "{category}: already {MAX_PAIRWISE_LIGANDS} ligands, \
                 ignoring {ligand}"
            );
            return Ok(false);
        }
        picks.push(ligand.to_owned());
        Ok(true)
    }

    /// Whether [`SelectionDraft::submit`] would succeed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.receptor()
            .is_some_and(|(c, _)| !self.ligands(c).is_empty())
    }

    /// The docking request for the current picks.
    pub fn submit(&self) -> Result<Selection, DockviewError> {
        let Some((category, protein)) = self.receptor() else {
            return Err(DockviewError::Configuration(
                "select a protein and at least one ligand".into(),
            ));
        };
        let selection =
            Selection::new(protein, self.ligands(category).iter().cloned());
        selection.validate_pairwise()?;
        Ok(selection)
    }
}
