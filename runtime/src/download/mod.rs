//! Download orchestrator: unit → picture files in the cache tree.
//!
//! Pictures are fetched in order into `{work}/{unit}/{index:05}.{ext}`
//! under the source's cache namespace. A picture that exhausts its attempts
//! aborts the unit; files already written stay on disk.

use crate::acquisition::discovery::set_pictures;
use crate::acquisition::retry::attempt_until_success;
use crate::error::Result;
use crate::model::ContentUnit;
use crate::provider::Provider;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Extension used when a picture URL has none.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Lower-cased extension of the last path segment of `url`, query and
/// fragment ignored.
pub fn picture_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let segment = path.rsplit('/').next().unwrap_or_default();
    match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Cache-relative file name of the `index`-th picture (0-based).
pub fn picture_file_name(folder: &str, index: usize, url: &str) -> String {
    format!("{folder}/{index:05}.{}", picture_extension(url))
}

/// Download every picture of `unit`, discovering them first if needed.
///
/// Returns the folder holding the files.
pub async fn download(provider: &dyn Provider, unit: &mut ContentUnit) -> Result<PathBuf> {
    download_truncated(provider, unit, None).await
}

/// [`download`] with work and unit names truncated to `max_name_len`
/// characters in the folder name.
pub async fn download_truncated(
    provider: &dyn Provider,
    unit: &mut ContentUnit,
    max_name_len: Option<usize>,
) -> Result<PathBuf> {
    if unit.pictures.is_empty() {
        set_pictures(provider, unit).await?;
    }

    let session = provider.session();
    let folder = unit.folder_name(max_name_len);
    let unit: &ContentUnit = unit;

    for (index, picture) in unit.pictures.iter().enumerate() {
        let file_name = picture_file_name(&folder, index, picture);
        let file_name = file_name.as_str();
        let picture = picture.as_str();
        attempt_until_success(session.picture_attempts(), picture, move |_| {
            provider.fetch_picture(unit, picture, file_name)
        })
        .await?;
    }

    let location = session.storage_dir(&folder);
    tracing::info!(
        "downloaded {} pictures of {} to {}",
        unit.pictures.len(),
        unit.url,
        location.display()
    );
    Ok(location)
}

/// Outcome of one unit in a batch.
#[derive(Debug)]
pub struct UnitDownload {
    pub unit: ContentUnit,
    pub result: Result<PathBuf>,
}

/// Runs many unit downloads over one shared source.
#[derive(Clone)]
pub struct Downloader {
    provider: Arc<dyn Provider>,
}

impl Downloader {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Download one unit.
    pub async fn download(&self, unit: &mut ContentUnit) -> Result<PathBuf> {
        download(self.provider.as_ref(), unit).await
    }

    /// Download `units` with at most `concurrency` in flight.
    ///
    /// Each unit keeps its own abort-on-exhaustion semantics; one failed unit
    /// does not stop the others. Results arrive in completion order.
    pub async fn download_many(
        &self,
        units: Vec<ContentUnit>,
        concurrency: usize,
    ) -> Vec<UnitDownload> {
        stream::iter(units)
            .map(|mut unit| {
                let provider = Arc::clone(&self.provider);
                async move {
                    let result = download(provider.as_ref(), &mut unit).await;
                    if let Err(e) = &result {
                        tracing::warn!("download of {} failed: {e}", unit.url);
                    }
                    UnitDownload { unit, result }
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}
