//! Chromium-based renderer using chromiumoxide.
//!
//! Each [`ChromiumRenderer::render`] call launches its own browser process
//! with a throwaway profile directory. The process is closed when the render
//! finishes, fails, or the calling task is dropped.

use super::Renderer;
use crate::config::RuntimeConfig;
use crate::error::{FetchError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);
const DOM_READY_CHECK: &str =
    "location.href !== 'about:blank' && document.readyState !== 'loading'";

/// Executable names looked up on `PATH`, most specific first.
const PATH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Browser location chosen by `TANKOBON_CHROMIUM_PATH`, then a managed
/// install under `~/.tankobon/chromium/`, then `PATH`, then the usual macOS
/// application bundle.
pub fn find_chromium() -> Option<PathBuf> {
    let configured = std::env::var_os("TANKOBON_CHROMIUM_PATH").map(PathBuf::from);
    locate(configured, dirs::home_dir().as_deref())
        .or_else(|| PATH_NAMES.iter().find_map(|name| which::which(name).ok()))
        .or_else(|| {
            let bundle =
                PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
            (cfg!(target_os = "macos") && bundle.is_file()).then_some(bundle)
        })
}

/// The first existing file among an explicit path and the managed installs
/// under `home`.
fn locate(configured: Option<PathBuf>, home: Option<&Path>) -> Option<PathBuf> {
    let managed = home.map(|h| h.join(".tankobon/chromium")).into_iter().flat_map(|root| {
        let platform = if cfg!(target_os = "macos") {
            let app = "Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing";
            vec![
                root.join("chrome-mac-arm64").join(app),
                root.join("chrome-mac-x64").join(app),
            ]
        } else {
            vec![root.join("chrome-linux64/chrome")]
        };
        platform.into_iter().chain(std::iter::once(root.join("chrome")))
    });
    configured.into_iter().chain(managed).find(|p| p.is_file())
}

/// Renders pages in a short-lived headless Chromium, one process per call.
pub struct ChromiumRenderer {
    executable: PathBuf,
    timeout: Duration,
}

impl ChromiumRenderer {
    /// Locate a browser using the configured path or [`find_chromium`].
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let executable = config
            .chromium_path
            .clone()
            .filter(|p| p.exists())
            .or_else(find_chromium)
            .ok_or_else(|| {
                FetchError::BrowserUnavailable(
                    "Chromium not found; set TANKOBON_CHROMIUM_PATH".to_string(),
                )
            })?;
        Ok(Self::with_executable(executable, config.render_timeout))
    }

    pub fn with_executable(executable: PathBuf, timeout: Duration) -> Self {
        Self {
            executable,
            timeout,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        let session = BrowserSession::launch(&self.executable).await?;
        tracing::debug!("rendering {url} in {}", session.profile_dir.display());

        let result = tokio::time::timeout(self.timeout, session.capture(url)).await;
        session.close().await;

        match result {
            Ok(html) => html,
            Err(_) => Err(FetchError::RenderFailure(format!(
                "rendering {url} timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

/// One browser process plus its event-handler task and profile directory.
///
/// `close` is the orderly path; `Drop` covers cancellation and panics.
struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl BrowserSession {
    async fn launch(executable: &Path) -> Result<Self> {
        let profile_dir =
            std::env::temp_dir().join(format!("tankobon-render-{}", uuid::Uuid::new_v4()));

        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .user_data_dir(&profile_dir)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| FetchError::RenderFailure(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::RenderFailure(format!("failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler,
            profile_dir,
        })
    }

    async fn capture(&self, url: &str) -> Result<String> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| FetchError::RenderFailure("browser already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::RenderFailure(format!("failed to create page: {e}")))?;

        let html = navigate_and_serialize(&page, url).await;
        let _ = page.close().await;
        html
    }

    async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            let _ = browser.close().await;
            let _ = browser.wait().await;
        }
        self.handler.abort();
        let _ = tokio::fs::remove_dir_all(&self.profile_dir).await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if let Some(mut browser) = self.browser.take() {
            let profile_dir = self.profile_dir.clone();
            if let Ok(rt) = tokio::runtime::Handle::try_current() {
                rt.spawn(async move {
                    let _ = browser.kill().await;
                    let _ = tokio::fs::remove_dir_all(&profile_dir).await;
                });
            }
        }
    }
}

/// Navigate, wait until the DOM is constructed, and return the HTML.
///
/// `Page::goto` resolves on the `load` event, after every subresource. The
/// readyState poll runs alongside it so serialization starts as soon as
/// DOMContentLoaded has fired, without waiting for images.
async fn navigate_and_serialize(page: &Page, url: &str) -> Result<String> {
    let navigation = page.goto(url);
    tokio::pin!(navigation);
    let mut navigated = false;

    loop {
        tokio::select! {
            result = &mut navigation, if !navigated => {
                result.map_err(|e| {
                    FetchError::RenderFailure(format!("navigation to {url} failed: {e}"))
                })?;
                navigated = true;
            }
            ready = dom_ready(page) => match ready {
                Ok(true) => break,
                Ok(false) => {}
                // The execution context is swapped out while navigating.
                Err(e) if !navigated => tracing::trace!("readyState check on {url}: {e}"),
                Err(e) => return Err(e),
            },
        }
    }

    let html: String = page
        .evaluate("document.documentElement.outerHTML")
        .await
        .map_err(|e| FetchError::RenderFailure(format!("failed to get HTML: {e}")))?
        .into_value()
        .map_err(|e| FetchError::RenderFailure(format!("failed to convert HTML result: {e:?}")))?;

    Ok(html)
}

/// Whether the navigated document has left the `loading` state.
///
/// The initial `about:blank` document never counts as ready.
async fn dom_ready(page: &Page) -> Result<bool> {
    tokio::time::sleep(READY_POLL_INTERVAL).await;
    page.evaluate(DOM_READY_CHECK)
        .await
        .map_err(|e| FetchError::RenderFailure(format!("readyState check failed: {e}")))?
        .into_value()
        .map_err(|e| FetchError::RenderFailure(format!("bad readyState value: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_prefers_configured_then_managed_install() {
        let home = tempfile::tempdir().unwrap();
        assert_eq!(locate(None, Some(home.path())), None);

        let managed = home.path().join(".tankobon/chromium/chrome");
        std::fs::create_dir_all(managed.parent().unwrap()).unwrap();
        std::fs::write(&managed, b"").unwrap();
        assert_eq!(locate(None, Some(home.path())), Some(managed.clone()));

        let configured = home.path().join("my-chrome");
        std::fs::write(&configured, b"").unwrap();
        assert_eq!(
            locate(Some(configured.clone()), Some(home.path())),
            Some(configured)
        );

        let missing = home.path().join("gone");
        assert_eq!(locate(Some(missing), Some(home.path())), Some(managed));
    }

    #[test]
    fn test_missing_configured_path_falls_back_to_search() {
        let cfg = RuntimeConfig {
            chromium_path: Some(PathBuf::from("/definitely/not/a/browser")),
            ..RuntimeConfig::default()
        };
        match ChromiumRenderer::new(&cfg) {
            Ok(r) => assert_ne!(r.executable(), Path::new("/definitely/not/a/browser")),
            Err(e) => assert!(matches!(e, FetchError::BrowserUnavailable(_))),
        }
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_render_data_url() {
        let renderer = ChromiumRenderer::new(&RuntimeConfig::default())
            .expect("failed to locate Chromium");
        let html = renderer
            .render("data:text/html,<h1>Hello</h1><p>World</p>")
            .await
            .expect("render failed");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_render_does_not_wait_for_slow_images() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chapter/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(r#"<html><body><p>ready</p><img src="/slow.jpg"></body></html>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow.jpg"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(60)))
            .mount(&server)
            .await;

        let executable = find_chromium().expect("failed to locate Chromium");
        let renderer = ChromiumRenderer::with_executable(executable, Duration::from_secs(15));
        let html = renderer
            .render(&format!("{}/chapter/1", server.uri()))
            .await
            .expect("render should finish before the image loads");
        assert!(html.contains("<p>ready</p>"));
    }
}
