use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where artifacts are read from.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Plain HTTP GET against the static file server.
    #[default]
    Http,
    /// A local checkout of the artifact tree.
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Source", inline)]
#[serde(default)]
/// Artifact retrieval settings.
pub struct SourceOptions {
    /// Which kind of source to read from.
    #[schemars(title = "Source Kind")]
    pub kind: SourceKind,
    /// Base URL of the static file server; artifact paths are appended.
    #[schemars(title = "Base URL")]
    pub base_url: String,
    /// Root directory for [`SourceKind::Directory`].
    #[schemars(title = "Root Directory")]
    pub root_dir: PathBuf,
    /// Per-request timeout in seconds.
    #[schemars(title = "Timeout", range(min = 1, max = 600))]
    pub timeout_secs: u64,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            kind: SourceKind::Http,
            base_url: "http://localhost:3001".into(),
            root_dir: PathBuf::from("public"),
            timeout_secs: 30,
        }
    }
}
