// Copyright 2026 Tankobon Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tankobon_runtime::{cli, logging};

#[derive(Parser)]
#[command(
    name = "tankobon",
    about = "Tankobon: pluggable content retrieval with caching and a browser fallback",
    version,
    after_help = "Run 'tankobon <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Cache root (overrides TANKOBON_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered sources
    Sources,
    /// Search a source for works
    Search {
        /// Source name (see `tankobon sources`)
        source: String,
        /// Search terms; empty browses the default listing
        #[arg(default_value = "")]
        query: String,
        /// 1-based results page
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// List the units (chapters) of a work
    Chapters {
        /// URL of the work
        card_url: String,
        /// Display name of the work
        #[arg(long, default_value = "")]
        name: String,
        /// 1-based page of 20 units
        #[arg(long, default_value = "1")]
        page: u32,
        /// Stream every unit instead of one page
        #[arg(long)]
        all: bool,
    },
    /// Discover the picture URLs of one unit
    Pictures {
        /// URL of the unit
        url: String,
        /// URL of the owning work, sent as Referer
        #[arg(long)]
        card_url: Option<String>,
    },
    /// Download one unit into the cache tree
    Download {
        /// URL of the unit
        url: String,
        /// URL of the owning work
        #[arg(long)]
        card_url: String,
        /// Name of the owning work (folder name)
        #[arg(long)]
        card_name: String,
        /// Name of the unit (folder name)
        #[arg(long)]
        name: String,
        /// Truncate folder names to this many characters
        #[arg(long)]
        max_name_len: Option<usize>,
    },
    /// Download every unit of a work
    DownloadAll {
        /// URL of the work
        card_url: String,
        /// Name of the work (folder name)
        #[arg(long)]
        card_name: String,
        /// Units downloaded in parallel (overrides TANKOBON_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Check tracked works against a source's latest updates
    Updates {
        /// Source name
        source: String,
        /// Known state as CARD_URL=UNIT_URL. Can be repeated.
        #[arg(long = "record")]
        records: Vec<String>,
    },
    /// Render a page in headless Chromium and print its HTML
    Render {
        /// URL to render
        url: String,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Manage the on-disk cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete cached files for one source, or all of them
    Clear {
        /// Source name; omit to clear everything
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var(cli::output::JSON_ENV, "1");
    }
    if cli.quiet {
        std::env::set_var(cli::output::QUIET_ENV, "1");
    }
    logging::init(cli.verbose, cli.json, cli.no_color);

    let cache_dir = cli.cache_dir.as_deref();
    let result = match cli.command {
        Commands::Sources => cli::sources_cmd::run(cache_dir).await,
        Commands::Search {
            source,
            query,
            page,
        } => cli::search_cmd::run(cache_dir, &source, &query, page).await,
        Commands::Chapters {
            card_url,
            name,
            page,
            all,
        } => cli::chapters_cmd::run(cache_dir, &card_url, &name, page, all).await,
        Commands::Pictures { url, card_url } => {
            cli::pictures_cmd::run(cache_dir, &url, card_url.as_deref()).await
        }
        Commands::Download {
            url,
            card_url,
            card_name,
            name,
            max_name_len,
        } => {
            cli::download_cmd::run(cache_dir, &url, &card_url, &card_name, &name, max_name_len)
                .await
        }
        Commands::DownloadAll {
            card_url,
            card_name,
            concurrency,
        } => cli::download_cmd::run_all(cache_dir, &card_url, &card_name, concurrency).await,
        Commands::Updates { source, records } => {
            cli::updates_cmd::run(cache_dir, &source, &records).await
        }
        Commands::Render { url } => cli::render_cmd::run(cache_dir, &url).await,
        Commands::Doctor => cli::doctor::run(cache_dir).await,
        Commands::Cache { action } => match action {
            CacheAction::Clear { source } => {
                cli::cache_cmd::run_clear(cache_dir, source.as_deref()).await
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "tankobon", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else if !cli::output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
