//! Reusable picture-extraction strategies for providers.
//!
//! Providers try the structured path first ([`flight_pages`], data embedded
//! by the site's frontend framework) and fall back to scanning `<img>` tags
//! ([`img_sources`]). Neither helper raises: malformed input yields `None`
//! or an empty list.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

/// Marker of a Next.js App Router flight chunk.
const FLIGHT_MARKER: &str = "self.__next_f.push";
/// Escaped `"pages"` key as it appears inside a flight chunk string.
const ESCAPED_PAGES_KEY: &str = r#"\"pages\""#;

fn pages_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\\"pages\\":(\[.*?\])"#).expect("pages regex is valid"))
}

/// Picture URLs from the first flight chunk that carries a `pages` array.
///
/// Returns `None` when no chunk matches or the array cannot be decoded, so
/// the caller can move on to the next strategy.
pub fn flight_pages(html: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("script").ok()?;

    for script in document.select(&sel) {
        let text: String = script.text().collect();
        if !text.contains(FLIGHT_MARKER) || !text.contains(ESCAPED_PAGES_KEY) {
            continue;
        }
        let Some(caps) = pages_regex().captures(&text) else {
            continue;
        };
        let raw = caps[1].replace(r#"\""#, "\"");
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(pages) => {
                let urls: Vec<String> = pages
                    .iter()
                    .filter_map(|p| p.get("url").and_then(|u| u.as_str()))
                    .map(str::to_string)
                    .collect();
                tracing::debug!("found {} picture links in flight data", urls.len());
                return Some(urls);
            }
            Err(e) => {
                tracing::warn!("flight pages payload is not valid JSON: {e}");
            }
        }
    }
    None
}

/// `src` attributes of images matching `selector` whose path ends with one
/// of `extensions` (case-insensitive, query string ignored).
pub fn img_sources(html: &str, selector: &str, extensions: &[&str]) -> Vec<String> {
    let Ok(sel) = Selector::parse(selector) else {
        tracing::warn!("invalid image selector: {selector}");
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let urls: Vec<String> = document
        .select(&sel)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| {
            let path = src.split(['?', '#']).next().unwrap_or("").to_ascii_lowercase();
            extensions.iter().any(|ext| path.ends_with(ext))
        })
        .map(str::to_string)
        .collect();
    tracing::debug!("found {} picture links via img tags", urls.len());
    urls
}
