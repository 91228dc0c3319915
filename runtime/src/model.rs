//! Domain entities: works (cards), installments (units) and update records.
//!
//! Cards and units are transient values built per request. They refer back
//! to their source by name; the live provider is looked up in the
//! [`SourceRegistry`](crate::provider::registry::SourceRegistry).

use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::sync::Arc;

/// A discoverable work, e.g. a series. Identity is the canonical URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCard {
    /// Name of the owning source.
    pub source: String,
    /// Display name.
    pub name: String,
    /// Canonical URL.
    pub url: String,
    /// Cover image URL (may be empty).
    pub cover_url: String,
}

impl ContentCard {
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        cover_url: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            url: url.into(),
            cover_url: cover_url.into(),
        }
    }

    /// Stable deduplication key derived from the URL.
    pub fn unique(&self) -> String {
        unique_key(&self.url)
    }
}

impl PartialEq for ContentCard {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for ContentCard {}

/// An installment (chapter / episode) of a work. Identity is the canonical URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Name of the owning source.
    pub source: String,
    /// Display name.
    pub name: String,
    /// Canonical URL.
    pub url: String,
    /// The work this unit belongs to, shared between sibling units.
    pub card: Arc<ContentCard>,
    /// Ordered picture URLs; empty until discovery runs.
    pub pictures: Vec<String>,
}

impl ContentUnit {
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        card: Arc<ContentCard>,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            url: url.into(),
            card,
            pictures: Vec::new(),
        }
    }

    /// Stable deduplication key derived from the URL.
    pub fn unique(&self) -> String {
        unique_key(&self.url)
    }

    /// Cache-relative folder for this unit: `{work}/{unit}`, both sanitized
    /// and optionally truncated to `max_len` characters each.
    ///
    /// Components that sanitize to nothing are left out; a unit with no
    /// usable names at all falls back to its [`unique`](Self::unique) key.
    pub fn folder_name(&self, max_len: Option<usize>) -> String {
        let parts: Vec<String> = [&self.card.name, &self.name]
            .into_iter()
            .map(|name| clean(name, max_len))
            .filter(|part| !part.trim().is_empty())
            .collect();
        if parts.is_empty() {
            self.unique()
        } else {
            parts.join("/")
        }
    }
}

impl PartialEq for ContentUnit {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for ContentUnit {}

/// The last unit a caller has seen for a tracked work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// URL of the tracked card.
    pub card_url: String,
    /// URL of the newest unit the caller already knows about.
    pub unit_url: String,
}

impl UpdateRecord {
    pub fn new(card_url: impl Into<String>, unit_url: impl Into<String>) -> Self {
        Self {
            card_url: card_url.into(),
            unit_url: unit_url.into(),
        }
    }
}

/// Result of comparing known records against a site's updates page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDiff {
    /// Card URLs whose newest unit differs from the recorded one.
    pub updated: Vec<String>,
    /// Card URLs whose newest unit matches the recorded one.
    pub unchanged: Vec<String>,
}

/// 64-bit FNV-1a of the URL, hex encoded. Not for security use.
pub fn unique_key(url: &str) -> String {
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(url.as_bytes());
    format!("{:016x}", hasher.finish())
}

/// Sanitize a display name for use as a folder name.
///
/// Collapses runs of spaces to one, strips colons and optionally truncates
/// to `max_len` characters.
pub fn clean(name: &str, max_len: Option<usize>) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_space = false;
    for c in name.chars() {
        if c == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        out.push(c);
    }
    let out = out.replace(':', "");
    match max_len {
        Some(n) => out.chars().take(n).collect(),
        None => out,
    }
}
