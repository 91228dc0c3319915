//! Presence-based file cache: `{root}/{namespace}/{relative_path}`.
//!
//! A file's existence is a cache hit. Files are only written after a 2xx
//! response, and always via a temporary sibling plus rename so that no
//! reader observes a truncated entry. There is no expiry and no eviction.

use crate::acquisition::http_client::FetchResponse;
use crate::error::{FetchError, Result};
use std::future::Future;
use std::path::{Component, Path, PathBuf};

/// File cache shared by all sources; each source writes under its own namespace.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the cache tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one source's entries.
    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    /// Resolve a relative path inside a namespace.
    ///
    /// Rejects absolute paths and any `..` component.
    pub fn entry_path(&self, namespace: &str, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        if relative.is_empty()
            || !rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::InvalidCachePath(relative.to_string()));
        }
        if namespace.is_empty() || namespace.contains(['/', '\\']) || namespace == ".." {
            return Err(FetchError::InvalidCachePath(format!("{namespace}/{relative}")));
        }
        Ok(self.namespace_dir(namespace).join(rel))
    }

    /// Read an entry, returning `None` on a miss.
    pub async fn read(&self, namespace: &str, relative: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(namespace, relative)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether an entry exists.
    pub async fn contains(&self, namespace: &str, relative: &str) -> Result<bool> {
        let path = self.entry_path(namespace, relative)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Write an entry atomically, creating parent directories as needed.
    pub async fn write(&self, namespace: &str, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.entry_path(namespace, relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(path)
    }

    /// Return the cached bytes for `relative`, or run `fetch` and persist its
    /// body when the response is 2xx.
    ///
    /// A hit never invokes `fetch` and is reported as a 200 response with
    /// `from_cache` set. Non-2xx bodies are handed back but not stored.
    pub async fn read_or_fetch<F, Fut>(
        &self,
        namespace: &str,
        relative: &str,
        url: &str,
        fetch: F,
    ) -> Result<FetchResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FetchResponse>>,
    {
        if let Some(body) = self.read(namespace, relative).await? {
            tracing::debug!("cache hit: {namespace}/{relative}");
            return Ok(FetchResponse::cached(url, body));
        }

        let response = fetch().await?;
        if response.is_success() {
            self.write(namespace, relative, &response.body).await?;
            tracing::debug!(
                "cached {} bytes at {namespace}/{relative}",
                response.body.len()
            );
        } else {
            tracing::debug!(
                "not caching {namespace}/{relative}: status {}",
                response.status
            );
        }
        Ok(response)
    }

    /// Remove one namespace, or the whole tree when `namespace` is `None`.
    pub async fn clear(&self, namespace: Option<&str>) -> Result<()> {
        let dir = match namespace {
            Some(ns) => {
                if ns.is_empty() || ns.contains(['/', '\\']) || ns == ".." {
                    return Err(FetchError::InvalidCachePath(ns.to_string()));
                }
                self.namespace_dir(ns)
            }
            None => self.root.clone(),
        };
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!("cleared cache at {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn response(status: u16, body: &[u8]) -> FetchResponse {
        FetchResponse {
            url: "https://example.com/a.png".into(),
            final_url: "https://example.com/a.png".into(),
            status,
            headers: Vec::new(),
            body: body.to_vec(),
            from_cache: false,
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let calls = AtomicUsize::new(0);

        let first = store
            .read_or_fetch("src", "work/unit/00000.png", "u", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(response(200, b"image-bytes"))
            })
            .await
            .unwrap();
        assert!(!first.from_cache);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = store
            .read_or_fetch("src", "work/unit/00000.png", "u", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(response(200, b"other"))
            })
            .await
            .unwrap();
        assert!(second.from_cache);
        assert_eq!(second.status, 200);
        assert_eq!(second.body, b"image-bytes");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_success_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        let resp = store
            .read_or_fetch("src", "a/b.png", "u", || async {
                Ok(response(404, b"not found page"))
            })
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, b"not found page");
        assert!(!dir.path().join("src/a/b.png").exists());
        assert!(!store.contains("src", "a/b.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_leaves_no_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.write("src", "w/u/00001.jpg", b"abc").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("src/w/u"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["00001.jpg".to_string()]);
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let store = CacheStore::new("/tmp/cache");
        assert!(store.entry_path("src", "../etc/passwd").is_err());
        assert!(store.entry_path("src", "/etc/passwd").is_err());
        assert!(store.entry_path("src", "").is_err());
        assert!(store.entry_path("../x", "a.png").is_err());
        assert_eq!(
            store.entry_path("src", "a/b.png").unwrap(),
            PathBuf::from("/tmp/cache/src/a/b.png")
        );
    }

    #[tokio::test]
    async fn test_clear_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.write("one", "a.txt", b"1").await.unwrap();
        store.write("two", "a.txt", b"2").await.unwrap();

        store.clear(Some("one")).await.unwrap();
        assert!(!store.contains("one", "a.txt").await.unwrap());
        assert!(store.contains("two", "a.txt").await.unwrap());

        // Clearing a missing namespace is a no-op.
        store.clear(Some("missing")).await.unwrap();
    }
}
