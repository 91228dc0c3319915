//! CLI subcommand implementations for the `tankobon` binary.

pub mod cache_cmd;
pub mod chapters_cmd;
pub mod doctor;
pub mod download_cmd;
pub mod output;
pub mod pictures_cmd;
pub mod render_cmd;
pub mod search_cmd;
pub mod sources_cmd;
pub mod updates_cmd;

use crate::config::RuntimeConfig;
use crate::model::{ContentCard, ContentUnit};
use crate::provider::registry::{register_builtin, SourceRegistry};
use crate::provider::Provider;
use crate::renderer::default_renderer;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Environment config with the `--cache-dir` override applied.
pub fn runtime_config(cache_dir: Option<&Path>) -> RuntimeConfig {
    let config = RuntimeConfig::from_env();
    match cache_dir {
        Some(dir) => config.with_cache_dir(dir),
        None => config,
    }
}

/// The process registry with the built-in sources registered.
pub fn sources(config: &RuntimeConfig) -> Result<&'static SourceRegistry> {
    let registry = SourceRegistry::global();
    register_builtin(registry, config, || default_renderer(config))
        .context("failed to register built-in sources")?;
    Ok(registry)
}

/// The source that owns `url`.
pub fn source_for_url(config: &RuntimeConfig, url: &str) -> Result<Arc<dyn Provider>> {
    sources(config)?
        .find_by_url(url)
        .with_context(|| format!("no source handles {url}"))
}

/// A unit built from CLI arguments.
pub fn unit_from_args(
    provider: &dyn Provider,
    url: &str,
    name: &str,
    card_url: Option<&str>,
    card_name: &str,
) -> ContentUnit {
    let card = Arc::new(ContentCard::new(
        provider.name(),
        card_name,
        card_url.unwrap_or_default(),
        "",
    ));
    ContentUnit::new(provider.name(), name, url, card)
}
