//! Per-source HTTP session wrapping reqwest.
//!
//! One [`HttpClient`] exists per source for the life of the process. Clones
//! share the underlying connection pool and cookie store, so many picture
//! fetches can be in flight over one session without blocking each other.

use crate::cache::CacheStore;
use crate::config::RuntimeConfig;
use crate::error::{FetchError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::borrow::Cow;
use std::str::FromStr;
use url::Url;

/// Browser-like User-Agent sent by every source unless overridden.
pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/131.0.0.0 Safari/537.36";

const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("user-agent", DEFAULT_UA),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("connection", "keep-alive"),
];

/// Response from a fetch, either fresh from the network or read from cache.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code (200 for cache hits).
    pub status: u16,
    /// Response headers (selected subset).
    pub headers: Vec<(String, String)>,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// Whether the body came from the on-disk cache.
    pub from_cache: bool,
}

impl FetchResponse {
    /// Synthesize a 200 response for a cache hit.
    pub fn cached(url: &str, body: Vec<u8>) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            headers: Vec::new(),
            body,
            from_cache: true,
        }
    }

    /// Status in the 200-299 range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The block signal that routes discovery to the renderer.
    pub fn is_blocked(&self) -> bool {
        self.status == 403
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// The two request methods the engine issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl FromStr for HttpMethod {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            _ => Err(FetchError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Per-call options for [`HttpClient::get_url`].
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub method: HttpMethod,
    /// Headers overriding the session defaults by name.
    pub headers: Vec<(String, String)>,
    /// Url-encoded form fields, sent only with POST.
    pub form: Vec<(String, String)>,
    /// Cache-relative path; when set the fetch is read-through / write-through.
    pub cache_as: Option<String>,
}

impl FetchRequest {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(form: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            form,
            ..Self::default()
        }
    }

    /// Build a request from a method name, rejecting anything but GET/POST.
    pub fn with_method(method: &str) -> Result<Self> {
        Ok(Self {
            method: method.parse()?,
            ..Self::default()
        })
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn cache_as(mut self, relative: impl Into<String>) -> Self {
        self.cache_as = Some(relative.into());
        self
    }
}

/// HTTP session state for one source: name, base URL, default headers,
/// cookies and the cache namespace.
#[derive(Debug, Clone)]
pub struct HttpClient {
    name: String,
    base_url: Url,
    client: reqwest::Client,
    headers: HeaderMap,
    cache: CacheStore,
}

impl HttpClient {
    /// Create a session. `extra_headers` override the browser-like defaults.
    pub fn new(
        name: &str,
        base_url: &str,
        extra_headers: &[(&str, &str)],
        config: &RuntimeConfig,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)?;

        let mut headers = HeaderMap::new();
        for (k, v) in DEFAULT_HEADERS.iter().chain(extra_headers.iter()) {
            insert_header(&mut headers, k, v)?;
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .gzip(true)
            .build()?;

        Ok(Self {
            name: name.to_string(),
            base_url,
            client,
            headers,
            cache: CacheStore::new(config.cache_dir.clone()),
        })
    }

    /// Source name, also the cache namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Session default headers.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Resolve a possibly relative link against the source's base URL.
    pub fn absolute(&self, href: &str) -> Result<String> {
        Ok(self.base_url.join(href.trim())?.to_string())
    }

    /// Session defaults with per-call headers layered on top.
    pub fn merged_headers(&self, overrides: &[(String, String)]) -> Result<HeaderMap> {
        let mut merged = self.headers.clone();
        for (k, v) in overrides {
            insert_header(&mut merged, k, v)?;
        }
        Ok(merged)
    }

    /// Fetch a URL, going through the cache when `req.cache_as` is set.
    pub async fn get_url(&self, url: &str, req: &FetchRequest) -> Result<FetchResponse> {
        match &req.cache_as {
            Some(relative) => {
                self.cache
                    .read_or_fetch(&self.name, relative, url, || self.send(url, req))
                    .await
            }
            None => self.send(url, req).await,
        }
    }

    /// GET a URL and return only the body.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.get_url(url, &FetchRequest::get()).await?.body)
    }

    /// Issue the raw request with merged headers. Never touches the cache.
    pub async fn send(&self, url: &str, req: &FetchRequest) -> Result<FetchResponse> {
        let headers = self.merged_headers(&req.headers)?;
        let builder = match req.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url).form(&req.form),
        };

        tracing::debug!("{:?} {url} [{}]", req.method, self.name);
        let r = builder.headers(headers).send().await?;

        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let headers: Vec<(String, String)> = r
            .headers()
            .iter()
            .filter(|(k, _)| {
                matches!(
                    k.as_str(),
                    "content-type" | "content-length" | "last-modified" | "cache-control"
                )
            })
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = r.bytes().await?.to_vec();

        tracing::debug!("{url} -> {status} ({} bytes)", body.len());

        Ok(FetchResponse {
            url: url.to_string(),
            final_url,
            status,
            headers,
            body,
            from_cache: false,
        })
    }
}

fn insert_header(map: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| FetchError::InvalidHeader(format!("{name}: {e}")))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| FetchError::InvalidHeader(format!("{name}: {e}")))?;
    map.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpClient {
        HttpClient::new(
            "Example",
            "https://example.com/",
            &[("referer", "https://example.com/")],
            &RuntimeConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        let err = "delete".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedMethod(m) if m == "delete"));
        assert!(FetchRequest::with_method("PUT").is_err());
    }

    #[test]
    fn test_per_call_headers_override_defaults() {
        let c = client();
        let merged = c
            .merged_headers(&[
                ("User-Agent".into(), "custom/1.0".into()),
                ("Referer".into(), "https://example.com/series/x".into()),
            ])
            .unwrap();
        assert_eq!(merged.get("user-agent").unwrap(), "custom/1.0");
        assert_eq!(merged.get("referer").unwrap(), "https://example.com/series/x");
        assert_eq!(merged.get("accept-language").unwrap(), "en-US,en;q=0.9");
        // Defaults themselves are untouched.
        assert_eq!(c.default_headers().get("user-agent").unwrap(), DEFAULT_UA);
    }

    #[test]
    fn test_absolute_links() {
        let c = client();
        assert_eq!(
            c.absolute("/series/abc").unwrap(),
            "https://example.com/series/abc"
        );
        assert_eq!(
            c.absolute("https://cdn.example.com/a.png").unwrap(),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_cached_response_shape() {
        let r = FetchResponse::cached("https://x/a.png", b"abc".to_vec());
        assert!(r.is_success());
        assert!(r.from_cache);
        assert_eq!(r.text(), "abc");
    }
}
