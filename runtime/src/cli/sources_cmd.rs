//! `tankobon sources`: list registered sources.

use crate::cli::{output, runtime_config, sources};
use anyhow::Result;
use std::path::Path;

pub async fn run(cache_dir: Option<&Path>) -> Result<()> {
    let config = runtime_config(cache_dir);
    let registry = sources(&config)?;

    let mut listed = Vec::new();
    for name in registry.names() {
        let provider = registry.require(&name)?;
        listed.push(serde_json::json!({
            "name": name,
            "base_url": provider.session().http().base_url().as_str(),
        }));
        if !output::is_json() {
            println!("  {name:<16} {}", provider.session().http().base_url());
        }
    }

    if output::is_json() {
        output::print_json(&serde_json::Value::Array(listed));
    }
    Ok(())
}
