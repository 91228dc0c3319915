//! `tankobon search <source> [query]`: list works from a source.

use crate::cli::{output, runtime_config, sources};
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(cache_dir: Option<&Path>, source: &str, query: &str, page: u32) -> Result<()> {
    let config = runtime_config(cache_dir);
    let provider = sources(&config)?.require(source)?;

    let cards = provider
        .search(query, page)
        .await
        .with_context(|| format!("search on {source} failed"))?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&cards)?);
        return Ok(());
    }

    if cards.is_empty() {
        if !output::is_quiet() {
            println!("  No results.");
        }
        return Ok(());
    }
    for card in &cards {
        println!("  {:<40} {}", card.name, card.url);
    }
    Ok(())
}
