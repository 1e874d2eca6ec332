use std::path::{Path, PathBuf};

use super::ArtifactSource;
use crate::error::DockviewError;

/// Reads artifacts from a local checkout of the static file tree.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Source rooted at `root`; artifact `/x/y.txt` maps to `root/x/y.txt`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Filesystem location of an artifact path. `..` components are
    /// dropped so lookups stay under the root.
    #[must_use]
    pub fn local_path(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
            .fold(self.root.clone(), |acc, c| acc.join(c))
    }
}

impl ArtifactSource for DirSource {
    async fn fetch_text(&self, path: &str) -> Result<String, DockviewError> {
        let local = self.local_path(path);
        log::debug!("reading {}", local.display());
        std::fs::read_to_string(&local)
            .map_err(|e| DockviewError::fetch(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("results")).unwrap();
        std::fs::write(dir.path().join("results/a.txt"), "1,-1,0,0\n").unwrap();

        let source = DirSource::new(dir.path());
        let text =
            pollster::block_on(source.fetch_text("/results/a.txt")).unwrap();
        assert_eq!(text, "1,-1,0,0\n");

        let missing = pollster::block_on(source.fetch_text("/results/b.txt"));
        assert!(missing.unwrap_err().is_fetch());
    }

    #[test]
    fn parent_components_stay_under_root() {
        let source = DirSource::new("/srv/tree");
        assert_eq!(
            source.local_path("/../etc/passwd"),
            PathBuf::from("/srv/tree/etc/passwd")
        );
    }
}
