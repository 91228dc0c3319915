//! Shared fixtures: a mock origin, a scripted renderer, and a provider wired
//! to both.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tankobon_runtime::acquisition::retry::Backoff;
use tankobon_runtime::config::RuntimeConfig;
use tankobon_runtime::model::{ContentCard, ContentUnit};
use tankobon_runtime::provider::asurascans::AsuraScans;
use tankobon_runtime::renderer::{NoopRenderer, Renderer};
use tankobon_runtime::{FetchError, Result};
use wiremock::MockServer;

/// Renderer that returns canned HTML (or a canned failure) and counts
/// invocations.
pub struct ScriptedRenderer {
    outcome: std::result::Result<String, String>,
    calls: AtomicU32,
}

impl ScriptedRenderer {
    pub fn new(html: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(html.into()),
            calls: AtomicU32::new(0),
        })
    }

    /// A renderer whose browser runs but fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(reason.into()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(&self, _url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map_err(FetchError::RenderFailure)
    }
}

/// Config with an isolated cache root and a millisecond backoff unit.
pub fn config(cache: &Path) -> RuntimeConfig {
    RuntimeConfig::default()
        .with_cache_dir(cache)
        .with_discovery_backoff(Backoff::new(3, Duration::from_millis(1)))
}

pub fn base_url(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

/// Provider pointed at the mock server.
pub fn provider(server: &MockServer, cache: &Path, renderer: Arc<dyn Renderer>) -> AsuraScans {
    AsuraScans::with_base_url(&base_url(server), &config(cache), renderer)
        .expect("provider builds")
}

pub fn http_only_provider(server: &MockServer, cache: &Path) -> AsuraScans {
    provider(server, cache, Arc::new(NoopRenderer))
}

/// A unit under `/series/solo` on the mock server.
pub fn unit(server: &MockServer, chapter: u32) -> ContentUnit {
    let card = Arc::new(ContentCard::new(
        "AsuraScans",
        "Solo  Leveling: S2",
        format!("{}/series/solo", server.uri()),
        "",
    ));
    ContentUnit::new(
        "AsuraScans",
        format!("Chapter {chapter}"),
        format!("{}/series/solo/chapter/{chapter}", server.uri()),
        card,
    )
}

/// A unit page carrying only `<img>` tags.
pub fn img_page(pictures: &[String]) -> String {
    let imgs: String = pictures
        .iter()
        .map(|p| format!(r#"<img src="{p}">"#))
        .collect();
    format!("<html><body>{imgs}</body></html>")
}
