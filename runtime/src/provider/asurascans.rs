//! Asura Scans (asuracomic.net).
//!
//! The site is a Next.js app: chapter pages embed their picture list in
//! flight chunks, and listing markup is keyed on Tailwind class strings,
//! which is why the selectors below match whole `class` attributes.

use super::extract::{flight_pages, img_sources};
use super::{partition_updates, PageContent, Provider};
use crate::acquisition::session::SourceSession;
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::model::{ContentCard, ContentUnit, UpdateDiff, UpdateRecord};
use crate::renderer::Renderer;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;

pub const NAME: &str = "AsuraScans";
pub const BASE_URL: &str = "https://asuracomic.net/";

const CARD_GRID: &str = r#"div[class="grid grid-cols-2 sm:grid-cols-2 md:grid-cols-5 gap-3 p-4"]"#;
const CARD: &str = r#"div[class="flex h-[250px] md:h-[200px] overflow-hidden relative hover:opacity-60"]"#;
const CARD_TITLE: &str = r#"span[class="block text-[13.3px] font-bold"]"#;
const CHAPTER_LIST: &str = r#"div[class="pl-4 pr-2 pb-4 overflow-y-auto scrollbar-thumb-themecolor scrollbar-track-transparent scrollbar-thin mr-3 max-h-[20rem] space-y-2.5"]"#;
const CHAPTER_ROW: &str = r#"div[class="pl-4 py-2 border rounded-md group w-full hover:bg-[#343434] cursor-pointer border-[#A2A2A2]/20 relative"]"#;
const CHAPTER_TITLE: &str = r#"h3[class="text-sm text-white font-medium flex flex-row"]"#;
const UPDATE_TITLE: &str = r#"span[class="text-[15px] font-medium hover:text-themecolor hover:cursor-pointer"]"#;
const CHAPTER_IMG: &str = r#"img[src*="chapter"]"#;
const PICTURE_EXTENSIONS: &[&str] = &[".jpg", ".png", ".jpeg"];

const SITE_HEADERS: &[(&str, &str)] = &[("referer", BASE_URL)];

/// Provider for Asura Scans.
pub struct AsuraScans {
    session: SourceSession,
}

impl AsuraScans {
    pub fn new(config: &RuntimeConfig, renderer: Arc<dyn Renderer>) -> Result<Self> {
        Self::with_base_url(BASE_URL, config, renderer)
    }

    /// Point the provider at a mirror (or a test server).
    pub fn with_base_url(
        base_url: &str,
        config: &RuntimeConfig,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self> {
        Ok(Self {
            session: SourceSession::new(NAME, base_url, SITE_HEADERS, config, renderer)?,
        })
    }

    fn absolute(&self, href: &str) -> Option<String> {
        self.session.http().absolute(href).ok()
    }

    /// Cards on a series listing page.
    pub fn cards_from_page(&self, html: &str) -> Vec<ContentCard> {
        let document = Html::parse_document(html);
        let (Ok(grid_sel), Ok(card_sel), Ok(title_sel), Ok(a_sel), Ok(img_sel)) = (
            Selector::parse(CARD_GRID),
            Selector::parse(CARD),
            Selector::parse(CARD_TITLE),
            Selector::parse("a"),
            Selector::parse("img"),
        ) else {
            return Vec::new();
        };

        let Some(grid) = document.select(&grid_sel).next() else {
            tracing::warn!("no series grid found on listing page");
            return Vec::new();
        };

        grid.select(&card_sel)
            .filter_map(|card| {
                let name = card
                    .select(&title_sel)
                    .next()
                    .map(|t| collapse_text(&t))
                    .filter(|n| !n.is_empty())?;
                let url = card
                    .select(&a_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| self.absolute(href))?;
                let cover = card
                    .select(&img_sel)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .unwrap_or_default();
                Some(ContentCard::new(NAME, name, url, cover))
            })
            .collect()
    }

    /// `card url -> newest unit url` from the front page's latest-updates feed.
    ///
    /// The first occurrence of a card wins.
    pub fn updates_from_page(&self, html: &str) -> HashMap<String, String> {
        let document = Html::parse_document(html);
        let Ok(title_sel) = Selector::parse(UPDATE_TITLE) else {
            return HashMap::new();
        };

        let ordered: Vec<ElementRef<'_>> = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        let next_after = |from: usize, tag: &str| -> Option<usize> {
            ordered
                .iter()
                .enumerate()
                .skip(from + 1)
                .find(|(_, el)| el.value().name() == tag)
                .map(|(i, _)| i)
        };

        let mut updates = HashMap::new();
        for (idx, _) in ordered
            .iter()
            .enumerate()
            .filter(|(_, el)| title_sel.matches(el))
        {
            let card_url = next_after(idx, "a")
                .and_then(|i| ordered[i].value().attr("href"))
                .and_then(|href| self.absolute(href));
            let Some(card_url) = card_url else { continue };
            if updates.contains_key(&card_url) {
                continue;
            }
            let unit_url = next_after(idx, "span")
                .and_then(|span| next_after(span, "a"))
                .and_then(|i| ordered[i].value().attr("href"))
                .and_then(|href| self.absolute(href));
            if let Some(unit_url) = unit_url {
                updates.insert(card_url, unit_url);
            }
        }
        updates
    }
}

#[async_trait]
impl Provider for AsuraScans {
    fn session(&self) -> &SourceSession {
        &self.session
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<ContentCard>> {
        let mut url = self.session.http().base_url().join("series")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.max(1).to_string());
            if !query.is_empty() {
                pairs.append_pair("name", query);
            }
        }
        let body = self.session.http().get_bytes(url.as_str()).await?;
        Ok(self.cards_from_page(&String::from_utf8_lossy(&body)))
    }

    fn units_from_page(&self, html: &str, card: &Arc<ContentCard>) -> Vec<ContentUnit> {
        let document = Html::parse_document(html);
        let (Ok(list_sel), Ok(row_sel), Ok(a_sel), Ok(title_sel)) = (
            Selector::parse(CHAPTER_LIST),
            Selector::parse(CHAPTER_ROW),
            Selector::parse("a"),
            Selector::parse(CHAPTER_TITLE),
        ) else {
            return Vec::new();
        };

        let Some(list) = document.select(&list_sel).next() else {
            tracing::warn!("no chapter list found for {}", card.url);
            return Vec::new();
        };

        list.select(&row_sel)
            .filter_map(|row| {
                let link = row.select(&a_sel).next()?;
                let url = link
                    .value()
                    .attr("href")
                    .and_then(|href| self.absolute(href))?;
                let title = link
                    .select(&title_sel)
                    .next()
                    .map(|h| collapse_text(&h))
                    .filter(|t| !t.is_empty())?;
                Some(ContentUnit::new(NAME, title, url, Arc::clone(card)))
            })
            .collect()
    }

    fn extract_pictures(&self, content: PageContent<'_>) -> Vec<String> {
        let html = content.html();
        if let Some(pages) = flight_pages(&html).filter(|p| !p.is_empty()) {
            return pages;
        }
        let pictures = img_sources(&html, CHAPTER_IMG, PICTURE_EXTENSIONS);
        if pictures.is_empty() {
            tracing::warn!(
                "no pictures found (rendered: {}, {} bytes)",
                content.is_rendered(),
                html.len()
            );
        }
        pictures
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(self.session.http().base_url().as_str())
    }

    async fn diff_updates(&self, records: &[UpdateRecord]) -> Result<UpdateDiff> {
        let base = self.session.http().base_url().to_string();
        let body = self.session.http().get_bytes(&base).await?;
        let updates = self.updates_from_page(&String::from_utf8_lossy(&body));
        tracing::debug!("{} cards on the updates page", updates.len());
        Ok(partition_updates(records, |card| {
            updates.get(card).map(String::as_str)
        }))
    }
}

/// Text nodes of an element, trimmed and joined by single spaces.
fn collapse_text(el: &ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
