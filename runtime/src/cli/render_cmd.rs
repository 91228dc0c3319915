//! `tankobon render <url>`: render one page in headless Chromium.

use crate::cli::{output, runtime_config};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(cache_dir: Option<&Path>, url: &str) -> Result<()> {
    let config = runtime_config(cache_dir);
    let renderer = ChromiumRenderer::new(&config)?;
    let html = renderer
        .render(url)
        .await
        .with_context(|| format!("failed to render {url}"))?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "url": url,
            "bytes": html.len(),
            "html": html,
        }));
    } else {
        println!("{html}");
    }
    Ok(())
}
