//! Artifact retrieval.
//!
//! Every artifact is addressed by a `/`-rooted path into the static file
//! tree. Sources are async so independent fetches can overlap on a single
//! thread; no source retries on failure.

mod dir;
#[cfg(feature = "http")]
mod http;

use std::cell::RefCell;

pub use dir::DirSource;
#[cfg(feature = "http")]
pub use http::HttpSource;
use rustc_hash::FxHashMap;

use crate::error::DockviewError;
use crate::options::{SourceKind, SourceOptions};

/// Something that can hand back artifact text by path.
#[allow(async_fn_in_trait)]
pub trait ArtifactSource {
    /// Fetch the artifact at `path` as text.
    async fn fetch_text(&self, path: &str) -> Result<String, DockviewError>;
}

impl<S: ArtifactSource + ?Sized> ArtifactSource for &S {
    async fn fetch_text(&self, path: &str) -> Result<String, DockviewError> {
        (**self).fetch_text(path).await
    }
}

/// Source selected by [`SourceOptions`].
#[derive(Debug)]
pub enum ConfiguredSource {
    /// Static file server.
    #[cfg(feature = "http")]
    Http(HttpSource),
    /// Local artifact tree.
    Directory(DirSource),
}

impl ConfiguredSource {
    /// Build the source described by `options`.
    pub fn from_options(
        options: &SourceOptions,
    ) -> Result<Self, DockviewError> {
        match options.kind {
            #[cfg(feature = "http")]
            SourceKind::Http => Ok(Self::Http(HttpSource::new(
                &options.base_url,
                std::time::Duration::from_secs(options.timeout_secs),
            ))),
            #[cfg(not(feature = "http"))]
            SourceKind::Http => Err(DockviewError::Configuration(
                "HTTP source requested but the `http` feature is disabled"
                    .into(),
            )),
            SourceKind::Directory => {
                Ok(Self::Directory(DirSource::new(&options.root_dir)))
            }
        }
    }
}

impl ArtifactSource for ConfiguredSource {
    async fn fetch_text(&self, path: &str) -> Result<String, DockviewError> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(s) => s.fetch_text(path).await,
            Self::Directory(s) => s.fetch_text(path).await,
        }
    }
}

/// In-memory artifact store. Records every requested path.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: FxHashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl MemorySource {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an artifact.
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        let _ = self.files.insert(path.into(), text.into());
    }

    /// Builder-style [`MemorySource::insert`].
    #[must_use]
    pub fn with(
        mut self,
        path: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.insert(path, text);
        self
    }

    /// Paths requested so far, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ArtifactSource for MemorySource {
    async fn fetch_text(&self, path: &str) -> Result<String, DockviewError> {
        self.requests.borrow_mut().push(path.to_owned());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| DockviewError::fetch(path, "404 not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_serves_and_records() {
        let source = MemorySource::new().with("/a.txt", "alpha");
        let got = pollster::block_on(source.fetch_text("/a.txt")).unwrap();
        assert_eq!(got, "alpha");

        let err = pollster::block_on(source.fetch_text("/b.txt")).unwrap_err();
        assert!(err.is_fetch());
        assert_eq!(source.requests(), vec!["/a.txt", "/b.txt"]);
    }

    #[test]
    fn borrowed_source_forwards() {
        let source = MemorySource::new().with("/a.txt", "alpha");
        let by_ref = &source;
        let got = pollster::block_on(by_ref.fetch_text("/a.txt")).unwrap();
        assert_eq!(got, "alpha");
    }

    #[test]
    fn directory_source_from_options() {
        let options = SourceOptions {
            kind: SourceKind::Directory,
            ..SourceOptions::default()
        };
        let source = ConfiguredSource::from_options(&options).unwrap();
        assert!(matches!(source, ConfiguredSource::Directory(_)));
    }
}
