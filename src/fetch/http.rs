use std::time::Duration;

use futures::channel::oneshot;

use super::ArtifactSource;
use crate::error::DockviewError;

/// Fetches artifacts with plain HTTP GETs against the static file server.
///
/// Each request runs its blocking call on a short-lived helper thread and
/// completes through a oneshot channel, so several fetches awaited together
/// are actually in flight together.
#[derive(Clone)]
pub struct HttpSource {
    base_url: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpSource {
    /// Source for `base_url` with a per-request timeout.
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            agent,
        }
    }

    /// Full URL of an artifact path, each segment percent-encoded.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let encoded: Vec<_> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(urlencoding::encode)
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }
}

fn get_text(agent: &ureq::Agent, url: &str) -> Result<String, String> {
    agent
        .get(url)
        .call()
        .map_err(|e| e.to_string())?
        .into_body()
        .read_to_string()
        .map_err(|e| format!("failed to read response: {e}"))
}

impl ArtifactSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String, DockviewError> {
        let url = self.url_for(path);
        let agent = self.agent.clone();
        let (tx, rx) = oneshot::channel();
        log::debug!("GET {url}");

        let _ = std::thread::Builder::new()
            .name("dockview-fetch".into())
            .spawn(move || {
                let _ = tx.send(get_text(&agent, &url));
            })
            .map_err(|e| DockviewError::fetch(path, e))?;

        rx.await
            .map_err(|_| DockviewError::fetch(path, "fetch thread exited"))?
            .map_err(|reason| DockviewError::fetch(path, reason))
    }
}
