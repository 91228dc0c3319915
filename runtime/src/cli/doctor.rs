//! Environment readiness check.

use crate::cli::{output, runtime_config, sources};
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::path::Path;

/// Check browser availability and the cache directory.
pub async fn run(cache_dir: Option<&Path>) -> Result<()> {
    let config = runtime_config(cache_dir);
    let chromium = config
        .chromium_path
        .clone()
        .filter(|p| p.exists())
        .or_else(find_chromium);
    let cache_ok = cache_dir_writable(&config.cache_dir);
    let names = sources(&config)?.names();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "cache_dir": config.cache_dir.display().to_string(),
            "cache_writable": cache_ok,
            "sources": names,
        }));
        return Ok(());
    }

    println!("Tankobon Doctor");
    println!("===============");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. 403 fallback disabled; set TANKOBON_CHROMIUM_PATH."
        ),
    }
    if cache_ok {
        println!("[OK] Cache directory {} is writable", config.cache_dir.display());
    } else {
        println!(
            "[!!] Cache directory {} is not writable",
            config.cache_dir.display()
        );
    }
    println!("[OK] Sources: {}", names.join(", "));

    println!();
    if chromium.is_some() && cache_ok {
        println!("Status: READY");
    } else if cache_ok {
        println!("Status: READY (HTTP only)");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}

fn cache_dir_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let marker = dir.join(format!(".write-check-{}", uuid::Uuid::new_v4()));
    let ok = std::fs::write(&marker, b"").is_ok();
    let _ = std::fs::remove_file(&marker);
    ok
}
