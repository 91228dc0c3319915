//! `tankobon download` and `tankobon download-all`.

use crate::cli::{output, runtime_config, source_for_url, unit_from_args};
use crate::download::{download_truncated, Downloader};
use crate::model::ContentCard;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Download one unit and print the folder it landed in.
pub async fn run(
    cache_dir: Option<&Path>,
    url: &str,
    card_url: &str,
    card_name: &str,
    name: &str,
    max_name_len: Option<usize>,
) -> Result<()> {
    let config = runtime_config(cache_dir);
    let provider = source_for_url(&config, url)?;
    let mut unit = unit_from_args(provider.as_ref(), url, name, Some(card_url), card_name);

    let location = download_truncated(provider.as_ref(), &mut unit, max_name_len)
        .await
        .with_context(|| format!("download of {url} failed"))?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "url": url,
            "pictures": unit.pictures.len(),
            "location": location.display().to_string(),
        }));
    } else {
        println!("{}", location.display());
    }
    Ok(())
}

/// Download every unit of a work with bounded concurrency.
pub async fn run_all(
    cache_dir: Option<&Path>,
    card_url: &str,
    card_name: &str,
    concurrency: Option<usize>,
) -> Result<()> {
    let config = runtime_config(cache_dir);
    let provider = source_for_url(&config, card_url)?;
    let card = Arc::new(ContentCard::new(provider.name(), card_name, card_url, ""));

    let units = provider
        .all_units(&card)
        .await
        .with_context(|| format!("failed to list units of {card_url}"))?;
    if units.is_empty() {
        bail!("no units found at {card_url}");
    }
    let total = units.len();
    if !output::is_quiet() && !output::is_json() {
        println!("  Downloading {total} units...");
    }

    let results = Downloader::new(provider)
        .download_many(units, concurrency.unwrap_or(config.concurrency))
        .await;

    let mut failed = 0;
    let mut report = Vec::with_capacity(results.len());
    for done in &results {
        match &done.result {
            Ok(location) => {
                if !output::is_json() && !output::is_quiet() {
                    println!("  [OK] {:<32} {}", done.unit.name, location.display());
                }
                report.push(serde_json::json!({
                    "url": done.unit.url,
                    "location": location.display().to_string(),
                }));
            }
            Err(e) => {
                failed += 1;
                if !output::is_json() {
                    println!("  [!!] {:<32} {e}", done.unit.name);
                }
                report.push(serde_json::json!({
                    "url": done.unit.url,
                    "error": e.to_string(),
                }));
            }
        }
    }

    if output::is_json() {
        output::print_json(&serde_json::Value::Array(report));
    }
    if failed > 0 {
        bail!("{failed} of {total} units failed to download");
    }
    Ok(())
}
