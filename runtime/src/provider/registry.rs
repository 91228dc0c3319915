//! Process-wide registry of live sources, keyed by name.
//!
//! A source is created on first request and shared for the rest of the
//! process, so every caller reuses its connection pool, cookies and cache
//! namespace. There is no teardown: sources hold pooled connections only.

use super::asurascans::{self, AsuraScans};
use super::Provider;
use crate::config::RuntimeConfig;
use crate::error::{FetchError, Result};
use crate::renderer::Renderer;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

/// Name → live provider.
#[derive(Default)]
pub struct SourceRegistry {
    sources: DashMap<String, Arc<dyn Provider>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process.
    pub fn global() -> &'static SourceRegistry {
        static REGISTRY: OnceLock<SourceRegistry> = OnceLock::new();
        REGISTRY.get_or_init(SourceRegistry::new)
    }

    /// Return the source called `name`, building it with `create` if this is
    /// the first request. `create` runs at most once per name.
    pub fn get_or_create<F>(&self, name: &str, create: F) -> Result<Arc<dyn Provider>>
    where
        F: FnOnce() -> Result<Arc<dyn Provider>>,
    {
        match self.sources.entry(name.to_string()) {
            Entry::Occupied(e) => Ok(Arc::clone(e.get())),
            Entry::Vacant(v) => {
                let provider = create()?;
                tracing::debug!("registered source {name}");
                v.insert(Arc::clone(&provider));
                Ok(provider)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.sources.get(name).map(|p| Arc::clone(p.value()))
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Provider>> {
        self.get(name)
            .ok_or_else(|| FetchError::UnknownSource(name.to_string()))
    }

    /// The source whose `owns_url` accepts `url`. No network access.
    pub fn find_by_url(&self, url: &str) -> Result<Arc<dyn Provider>> {
        let mut owners: Vec<Arc<dyn Provider>> = self
            .sources
            .iter()
            .filter(|p| p.value().owns_url(url))
            .map(|p| Arc::clone(p.value()))
            .collect();
        // Stable pick when several sources claim the same URL.
        owners.sort_by(|a, b| a.name().cmp(b.name()));
        owners
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::UnknownSource(url.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.iter().map(|p| p.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Register the sources shipped with the crate.
///
/// `renderer` is only called for sources that are not registered yet.
pub fn register_builtin<R>(
    registry: &SourceRegistry,
    config: &RuntimeConfig,
    renderer: R,
) -> Result<()>
where
    R: Fn() -> Arc<dyn Renderer>,
{
    registry.get_or_create(asurascans::NAME, || {
        Ok(Arc::new(AsuraScans::new(config, renderer())?) as Arc<dyn Provider>)
    })?;
    Ok(())
}
