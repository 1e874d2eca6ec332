//! Crate-level error types.

use std::fmt;

/// Errors produced by the dockview crate.
#[derive(Debug)]
pub enum DockviewError {
    /// The selection cannot be mapped to artifacts (unregistered receptor,
    /// unknown dataset, empty ligand list).
    Configuration(String),
    /// A required artifact could not be retrieved.
    Fetch {
        /// Artifact path that was requested.
        path: String,
        /// Transport or status failure description.
        reason: String,
    },
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Category mapping document could not be read.
    Catalog(String),
    /// Trajectory metrics document is missing data or inconsistent.
    Metrics(String),
}

impl DockviewError {
    /// Fetch failure for `path`.
    pub fn fetch(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Fetch {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error comes from artifact retrieval.
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

impl fmt::Display for DockviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => {
                write!(f, "configuration error: {msg}")
            }
            Self::Fetch { path, reason } => {
                write!(f, "could not fetch {path}: {reason}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Catalog(msg) => write!(f, "catalog error: {msg}"),
            Self::Metrics(msg) => write!(f, "metrics error: {msg}"),
        }
    }
}

impl std::error::Error for DockviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DockviewError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
