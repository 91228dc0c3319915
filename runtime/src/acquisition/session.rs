//! Everything one source needs to fetch: HTTP session, renderer fallback and
//! retry settings.

use crate::acquisition::http_client::HttpClient;
use crate::acquisition::retry::Backoff;
use crate::cache::CacheStore;
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::renderer::Renderer;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared per-source fetch state. Cheap to clone.
#[derive(Clone)]
pub struct SourceSession {
    http: HttpClient,
    renderer: Arc<dyn Renderer>,
    picture_attempts: u32,
    discovery_backoff: Backoff,
}

impl SourceSession {
    /// Create the session for source `name` rooted at `base_url`.
    pub fn new(
        name: &str,
        base_url: &str,
        headers: &[(&str, &str)],
        config: &RuntimeConfig,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(name, base_url, headers, config)?,
            renderer,
            picture_attempts: config.picture_attempts.max(1),
            discovery_backoff: config.discovery_backoff,
        })
    }

    pub fn name(&self) -> &str {
        self.http.name()
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn cache(&self) -> &CacheStore {
        self.http.cache()
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn picture_attempts(&self) -> u32 {
        self.picture_attempts
    }

    pub fn discovery_backoff(&self) -> &Backoff {
        &self.discovery_backoff
    }

    /// Absolute folder a cache-relative path maps to for this source.
    pub fn storage_dir(&self, relative: &str) -> PathBuf {
        self.cache().namespace_dir(self.name()).join(relative)
    }
}
