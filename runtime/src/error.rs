//! Error types for the retrieval engine.
//!
//! Extraction misses are deliberately absent: a provider that finds no
//! pictures returns an empty list, and callers treat that as "no content"
//! rather than as a failure.

/// Convenience alias used throughout the library.
pub type Result<T, E = FetchError> = std::result::Result<T, E>;

/// All errors the fetch / cache / render / download pipeline can surface.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The origin answered 403. Normally consumed by the renderer fallback.
    #[error("blocked by origin: {url}")]
    BlockedByOrigin { url: String },

    /// A method other than GET or POST was requested.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Every attempt to fetch one picture failed; the owning unit is aborted.
    #[error("failed to download picture {url} after {attempts} attempts ({reason})")]
    PictureDownloadExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// A retried operation other than a picture fetch ran out of attempts.
    #[error("giving up on {url} after {attempts} attempts: {reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// The headless browser could not produce HTML.
    #[error("render failed: {0}")]
    RenderFailure(String),

    /// No browser executable could be located or launched.
    #[error("browser not available: {0}")]
    BrowserUnavailable(String),

    /// A cache path tried to escape its source namespace.
    #[error("invalid cache path: {0}")]
    InvalidCachePath(String),

    /// No registered source has the requested name or owns the URL.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// A response with an unexpected status where no fallback applies.
    #[error("unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether the discovery backoff loop may try again after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let server_error = FetchError::Status {
            url: "https://example.com".into(),
            status: 503,
        };
        let throttled = FetchError::Status {
            url: "https://example.com".into(),
            status: 429,
        };
        let not_found = FetchError::Status {
            url: "https://example.com".into(),
            status: 404,
        };
        assert!(server_error.is_transient());
        assert!(throttled.is_transient());
        assert!(!not_found.is_transient());
    }

    #[test]
    fn test_fatal_kinds_are_not_transient() {
        assert!(!FetchError::UnsupportedMethod("PUT".into()).is_transient());
        assert!(!FetchError::RenderFailure("crashed".into()).is_transient());
        assert!(!FetchError::BlockedByOrigin {
            url: "https://example.com".into()
        }
        .is_transient());
    }
}
