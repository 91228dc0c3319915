//! `tankobon chapters <card-url>`: list the units of a work.

use crate::cli::{output, runtime_config, source_for_url};
use crate::model::{ContentCard, ContentUnit};
use anyhow::{Context, Result};
use futures::TryStreamExt;
use std::path::Path;
use std::sync::Arc;

/// Print one page of units, or every unit as it is produced with `all`.
pub async fn run(
    cache_dir: Option<&Path>,
    card_url: &str,
    name: &str,
    page: u32,
    all: bool,
) -> Result<()> {
    let config = runtime_config(cache_dir);
    let provider = source_for_url(&config, card_url)?;

    let units: Vec<ContentUnit> = if all {
        let mut stream = provider.iter_units(card_url, name);
        let mut units = Vec::new();
        while let Some(unit) = stream.try_next().await? {
            if !output::is_json() {
                println!("  {:<40} {}", unit.name, unit.url);
            }
            units.push(unit);
        }
        units
    } else {
        let card = Arc::new(ContentCard::new(provider.name(), name, card_url, ""));
        let units = provider
            .list_units(&card, page)
            .await
            .with_context(|| format!("failed to list units of {card_url}"))?;
        if !output::is_json() {
            for unit in &units {
                println!("  {:<40} {}", unit.name, unit.url);
            }
        }
        units
    };

    if output::is_json() {
        let listed: Vec<serde_json::Value> = units
            .iter()
            .map(|u| serde_json::json!({ "name": u.name, "url": u.url }))
            .collect();
        output::print_json(&serde_json::Value::Array(listed));
    } else if units.is_empty() && !output::is_quiet() {
        println!("  No units found.");
    }
    Ok(())
}
