//! Picture discovery for a unit page.
//!
//! The page is fetched over plain HTTP inside the discovery backoff. A 403
//! ends the loop at once and the page is rendered in a headless browser a
//! single time; the rendered HTML goes through the same extraction.

use crate::acquisition::http_client::FetchRequest;
use crate::acquisition::retry::retry_with_backoff;
use crate::error::{FetchError, Result};
use crate::model::ContentUnit;
use crate::provider::{PageContent, Provider};

/// Outcome of one plain-HTTP attempt at a unit page.
enum UnitPage {
    Pictures(Vec<String>),
    Blocked,
}

/// Ordered picture URLs of `unit`, discovered through `provider`.
///
/// An empty list means the page had no recognizable pictures.
pub async fn discover_pictures(provider: &dyn Provider, unit: &ContentUnit) -> Result<Vec<String>> {
    let session = provider.session();
    let url = unit.url.as_str();
    let req = FetchRequest {
        headers: provider.unit_headers(unit),
        ..FetchRequest::get()
    };
    let req = &req;

    let page = retry_with_backoff(session.discovery_backoff(), url, move |attempt| async move {
        tracing::debug!("discovering pictures for {url} (attempt {attempt})");
        let resp = session.http().send(url, req).await?;
        if resp.is_blocked() {
            return Ok(UnitPage::Blocked);
        }
        if resp.status >= 500 || resp.status == 429 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status,
            });
        }
        Ok(UnitPage::Pictures(
            provider.extract_pictures(PageContent::Response(&resp)),
        ))
    })
    .await?;

    match page {
        UnitPage::Pictures(pictures) => Ok(pictures),
        UnitPage::Blocked => {
            tracing::warn!("{url} answered 403, falling back to the renderer");
            let html = match session.renderer().render(url).await {
                Ok(html) => html,
                // No browser to bypass with: surface the block.
                Err(FetchError::BrowserUnavailable(reason)) => {
                    tracing::warn!("cannot bypass block on {url}: {reason}");
                    return Err(FetchError::BlockedByOrigin {
                        url: url.to_string(),
                    });
                }
                Err(e) => return Err(e),
            };
            Ok(provider.extract_pictures(PageContent::Rendered(&html)))
        }
    }
}

/// Discover and store `unit`'s pictures, returning how many were found.
pub async fn set_pictures(provider: &dyn Provider, unit: &mut ContentUnit) -> Result<usize> {
    let pictures = discover_pictures(provider, unit).await?;
    if pictures.is_empty() {
        tracing::warn!("no pictures found for {}", unit.url);
    } else {
        tracing::debug!("{} pictures found for {}", pictures.len(), unit.url);
    }
    unit.pictures = pictures;
    Ok(unit.pictures.len())
}
