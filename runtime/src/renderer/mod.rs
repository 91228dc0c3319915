//! Renderer fallback for pages the plain HTTP client is blocked from.
//!
//! The only capability consumed is navigate-and-serialize: load a URL in a
//! headless browser, wait for the DOM, return the HTML. Implementations must
//! use a fresh session per call and tear it down before returning.

pub mod chromium;

use crate::config::RuntimeConfig;
use crate::error::{FetchError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A browser engine that can render one URL to HTML.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `url` and return the serialized DOM.
    async fn render(&self, url: &str) -> Result<String>;
}

/// A renderer used when no browser is available.
///
/// Blocked fetches surface as [`FetchError::BrowserUnavailable`] instead of
/// silently producing empty pages.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        Err(FetchError::BrowserUnavailable(format!(
            "cannot render {url} in HTTP-only mode"
        )))
    }
}

/// Chromium when a browser can be located, otherwise [`NoopRenderer`].
pub fn default_renderer(config: &RuntimeConfig) -> Arc<dyn Renderer> {
    match chromium::ChromiumRenderer::new(config) {
        Ok(r) => {
            tracing::debug!("renderer fallback uses {}", r.executable().display());
            Arc::new(r)
        }
        Err(e) => {
            tracing::debug!("renderer fallback disabled: {e}");
            Arc::new(NoopRenderer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_renderer_errors() {
        let err = NoopRenderer.render("https://example.com").await.unwrap_err();
        assert!(matches!(err, FetchError::BrowserUnavailable(_)));
    }
}
