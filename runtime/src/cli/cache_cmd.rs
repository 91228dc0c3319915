//! `tankobon cache clear [source]`

use crate::cache::CacheStore;
use crate::cli::{output, runtime_config};
use anyhow::{Context, Result};
use std::path::Path;

/// Delete one source's namespace, or the whole cache tree.
pub async fn run_clear(cache_dir: Option<&Path>, source: Option<&str>) -> Result<()> {
    let config = runtime_config(cache_dir);
    let store = CacheStore::new(config.cache_dir.clone());
    store
        .clear(source)
        .await
        .with_context(|| format!("failed to clear {}", store.root().display()))?;

    let target = match source {
        Some(name) => store.namespace_dir(name),
        None => store.root().to_path_buf(),
    };
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "cleared": target.display().to_string(),
        }));
    } else if !output::is_quiet() {
        println!("  Cleared {}", target.display());
    }
    Ok(())
}
