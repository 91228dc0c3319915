//! `tankobon pictures <chapter-url>`: run picture discovery for one unit.

use crate::acquisition::discovery::discover_pictures;
use crate::cli::{output, runtime_config, source_for_url, unit_from_args};
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(cache_dir: Option<&Path>, url: &str, card_url: Option<&str>) -> Result<()> {
    let config = runtime_config(cache_dir);
    let provider = source_for_url(&config, url)?;
    let unit = unit_from_args(provider.as_ref(), url, "", card_url, "");

    let pictures = discover_pictures(provider.as_ref(), &unit)
        .await
        .with_context(|| format!("picture discovery for {url} failed"))?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "url": url,
            "pictures": pictures,
        }));
    } else if pictures.is_empty() {
        if !output::is_quiet() {
            println!("  No pictures found.");
        }
    } else {
        for picture in &pictures {
            println!("{picture}");
        }
    }
    Ok(())
}
