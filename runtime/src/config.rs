//! Runtime configuration resolved from the environment.
//!
//! Every knob has a typed default; CLI flags override individual fields
//! after [`RuntimeConfig::from_env`] runs.

use crate::acquisition::retry::Backoff;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CACHE_DIR: &str = "cache";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RENDER_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_PICTURE_ATTEMPTS: u32 = 3;
const DEFAULT_DISCOVERY_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_UNIT_MS: u64 = 1_000;
const DEFAULT_CONCURRENCY: usize = 4;

/// Settings shared by every Source created in this process.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Root of the on-disk cache; each source gets `{cache_dir}/{name}/`.
    pub cache_dir: PathBuf,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Navigation timeout for the renderer fallback.
    pub render_timeout: Duration,
    /// Attempts per picture before the unit download is aborted.
    pub picture_attempts: u32,
    /// Backoff schedule for chapter-page discovery.
    pub discovery_backoff: Backoff,
    /// Explicit browser executable, bypassing discovery.
    pub chromium_path: Option<PathBuf>,
    /// Parallel unit downloads in batch mode.
    pub concurrency: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            render_timeout: Duration::from_millis(DEFAULT_RENDER_TIMEOUT_MS),
            picture_attempts: DEFAULT_PICTURE_ATTEMPTS,
            discovery_backoff: Backoff::new(
                DEFAULT_DISCOVERY_ATTEMPTS,
                Duration::from_millis(DEFAULT_BACKOFF_UNIT_MS),
            ),
            chromium_path: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl RuntimeConfig {
    /// Read `TANKOBON_*` variables, falling back to defaults for anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        let cache_dir = read_env_string("TANKOBON_CACHE_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        let backoff_unit = Duration::from_millis(
            read_env_u64("TANKOBON_BACKOFF_UNIT_MS", DEFAULT_BACKOFF_UNIT_MS).max(1),
        );

        Self {
            cache_dir,
            timeout: Duration::from_millis(
                read_env_u64("TANKOBON_TIMEOUT_MS", DEFAULT_TIMEOUT_MS).max(1),
            ),
            render_timeout: Duration::from_millis(
                read_env_u64("TANKOBON_RENDER_TIMEOUT_MS", DEFAULT_RENDER_TIMEOUT_MS).max(1),
            ),
            picture_attempts: read_env_u32("TANKOBON_PICTURE_ATTEMPTS", DEFAULT_PICTURE_ATTEMPTS)
                .max(1),
            discovery_backoff: Backoff::new(
                read_env_u32("TANKOBON_DISCOVERY_ATTEMPTS", DEFAULT_DISCOVERY_ATTEMPTS).max(1),
                backoff_unit,
            ),
            chromium_path: read_env_string("TANKOBON_CHROMIUM_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            concurrency: read_env_usize("TANKOBON_CONCURRENCY", DEFAULT_CONCURRENCY).max(1),
        }
    }

    /// Override the cache root.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Override the discovery backoff.
    pub fn with_discovery_backoff(mut self, backoff: Backoff) -> Self {
        self.discovery_backoff = backoff;
        self
    }
}

fn read_env_u64(name: &str, default_value: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default_value)
}

fn read_env_u32(name: &str, default_value: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default_value)
}

fn read_env_usize(name: &str, default_value: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default_value)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string())
}
