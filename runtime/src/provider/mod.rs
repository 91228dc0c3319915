//! The provider contract: what a site module implements so the engine can
//! search it, list its units and pull pictures out of its pages.
//!
//! A site supplies parsing (`search`, `units_from_page`, `extract_pictures`,
//! `owns_url`) and, optionally, update scraping. Fetching, caching, retries
//! and the renderer fallback are provided here and in [`crate::acquisition`];
//! the engine never looks at site markup itself.

pub mod asurascans;
pub mod extract;
pub mod registry;

use crate::acquisition::http_client::{FetchRequest, FetchResponse};
use crate::acquisition::session::SourceSession;
use crate::error::Result;
use crate::model::{ContentCard, ContentUnit, UpdateDiff, UpdateRecord};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::borrow::Cow;
use std::sync::Arc;

/// Units per page returned by [`Provider::list_units`].
pub const UNITS_PER_PAGE: usize = 20;

/// Lazily produced units of one work.
pub type UnitStream<'a> = BoxStream<'a, Result<ContentUnit>>;

/// What a provider extracts pictures from.
#[derive(Debug, Clone, Copy)]
pub enum PageContent<'a> {
    /// Raw body bytes.
    Raw(&'a [u8]),
    /// A full HTTP response, status and headers included.
    Response(&'a FetchResponse),
    /// HTML serialized by the renderer fallback.
    Rendered(&'a str),
}

impl<'a> PageContent<'a> {
    /// The page as HTML text.
    pub fn html(&self) -> Cow<'a, str> {
        match *self {
            PageContent::Raw(bytes) => String::from_utf8_lossy(bytes),
            PageContent::Response(resp) => String::from_utf8_lossy(&resp.body),
            PageContent::Rendered(html) => Cow::Borrowed(html),
        }
    }

    /// Whether the content came from the renderer.
    pub fn is_rendered(&self) -> bool {
        matches!(self, PageContent::Rendered(_))
    }
}

/// Slice a complete unit listing down to one 1-based page.
pub fn page_window<T>(mut items: Vec<T>, page: u32) -> Vec<T> {
    let start = (page.max(1) as usize - 1).saturating_mul(UNITS_PER_PAGE);
    if start >= items.len() {
        return Vec::new();
    }
    let end = (start + UNITS_PER_PAGE).min(items.len());
    items.truncate(end);
    items.split_off(start)
}

/// Partition known records against a scraped `card url -> newest unit url`
/// mapping.
///
/// Records whose card is missing from the mapping land in neither list.
/// Callers rely on that: an absent card means "no news", not "unchanged".
pub fn partition_updates<'m>(
    records: &[UpdateRecord],
    newest: impl Fn(&str) -> Option<&'m str>,
) -> UpdateDiff {
    let mut diff = UpdateDiff::default();
    for record in records {
        match newest(&record.card_url) {
            Some(unit) if unit != record.unit_url => diff.updated.push(record.card_url.clone()),
            Some(_) => diff.unchanged.push(record.card_url.clone()),
            None => {}
        }
    }
    diff
}

/// A site-specific module. One live instance per source name, shared by
/// every task in the process.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Fetch state owned by this source.
    fn session(&self) -> &SourceSession;

    /// Unique source name; also the cache namespace.
    fn name(&self) -> &str {
        self.session().name()
    }

    /// Parse a listing page. An empty query browses the default listing.
    async fn search(&self, query: &str, page: u32) -> Result<Vec<ContentCard>>;

    /// Parse every unit listed on a work's page, newest first as the site
    /// orders them.
    fn units_from_page(&self, html: &str, card: &Arc<ContentCard>) -> Vec<ContentUnit>;

    /// Ordered picture URLs of a unit page. Returns an empty list when
    /// neither the structured path nor the image-tag scan finds anything.
    fn extract_pictures(&self, content: PageContent<'_>) -> Vec<String>;

    /// Whether `url` belongs to this site. No network access.
    fn owns_url(&self, url: &str) -> bool;

    /// Fetch and parse the complete unit list of a work.
    async fn all_units(&self, card: &Arc<ContentCard>) -> Result<Vec<ContentUnit>> {
        let page = self.session().http().get_bytes(&card.url).await?;
        let html = String::from_utf8_lossy(&page);
        Ok(self.units_from_page(&html, card))
    }

    /// One page of [`UNITS_PER_PAGE`] units, windowed after parsing the full list.
    async fn list_units(&self, card: &Arc<ContentCard>, page: u32) -> Result<Vec<ContentUnit>> {
        Ok(page_window(self.all_units(card).await?, page))
    }

    /// Yield a work's units one at a time.
    ///
    /// Nothing is fetched until the stream is first polled; every call
    /// fetches afresh.
    fn iter_units<'a>(&'a self, url: &'a str, name: &'a str) -> UnitStream<'a> {
        Box::pin(async_stream::try_stream! {
            let card = Arc::new(ContentCard::new(self.name(), name, url, ""));
            let units = self.all_units(&card).await?;
            for unit in units {
                yield unit;
            }
        })
    }

    /// Compare known records against the site's latest updates.
    ///
    /// The default, for sites without an updates page, reports every record
    /// as updated.
    async fn diff_updates(&self, records: &[UpdateRecord]) -> Result<UpdateDiff> {
        Ok(UpdateDiff {
            updated: records.iter().map(|r| r.card_url.clone()).collect(),
            unchanged: Vec::new(),
        })
    }

    /// Headers sent when fetching a unit page or its pictures.
    fn unit_headers(&self, unit: &ContentUnit) -> Vec<(String, String)> {
        if unit.card.url.is_empty() {
            Vec::new()
        } else {
            vec![("referer".to_string(), unit.card.url.clone())]
        }
    }

    /// Fetch one picture of `unit`, cached under `cache_as`.
    async fn fetch_picture(
        &self,
        unit: &ContentUnit,
        url: &str,
        cache_as: &str,
    ) -> Result<FetchResponse> {
        let req = FetchRequest {
            headers: self.unit_headers(unit),
            ..FetchRequest::get()
        }
        .cache_as(cache_as);
        self.session().http().get_url(url, &req).await
    }

    /// Fetch a card's cover image, optionally through the cache.
    async fn fetch_cover(&self, card: &ContentCard, cache_as: Option<&str>) -> Result<FetchResponse> {
        let mut req = FetchRequest::get().header("referer", card.url.clone());
        if let Some(path) = cache_as {
            req = req.cache_as(path);
        }
        self.session().http().get_url(&card.cover_url, &req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_page_window() {
        let items: Vec<u32> = (0..45).collect();
        assert_eq!(page_window(items.clone(), 1), (0..20).collect::<Vec<_>>());
        assert_eq!(page_window(items.clone(), 2), (20..40).collect::<Vec<_>>());
        assert_eq!(page_window(items.clone(), 3), (40..45).collect::<Vec<_>>());
        assert!(page_window(items.clone(), 4).is_empty());
        // Page 0 is treated as the first page.
        assert_eq!(page_window(items, 0).len(), 20);
    }

    fn diff_against(mapping: &[(&str, &str)]) -> UpdateDiff {
        let map: HashMap<String, String> = mapping
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let records = vec![UpdateRecord::new("A", "U1")];
        partition_updates(&records, |card| map.get(card).map(String::as_str))
    }

    #[test]
    fn test_partition_newer_unit_is_updated() {
        let diff = diff_against(&[("A", "U2")]);
        assert_eq!(diff.updated, vec!["A"]);
        assert!(diff.unchanged.is_empty());
    }

    #[test]
    fn test_partition_same_unit_is_unchanged() {
        let diff = diff_against(&[("A", "U1")]);
        assert!(diff.updated.is_empty());
        assert_eq!(diff.unchanged, vec!["A"]);
    }

    #[test]
    fn test_partition_absent_card_is_dropped() {
        let diff = diff_against(&[]);
        assert!(diff.updated.is_empty());
        assert!(diff.unchanged.is_empty());
    }

    #[test]
    fn test_page_content_html() {
        let resp = FetchResponse::cached("u", b"<p>hi</p>".to_vec());
        assert_eq!(PageContent::Response(&resp).html(), "<p>hi</p>");
        assert_eq!(PageContent::Raw(b"<p>raw</p>").html(), "<p>raw</p>");
        assert!(PageContent::Rendered("<p>r</p>").is_rendered());
    }
}
