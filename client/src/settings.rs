use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Floor for the chat timeout. Document upload and processing is much slower
/// than a plain text exchange.
pub const MIN_CHAT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum InvalidBaseUrl {
    #[error("invalid base URL {url:?}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base URL {url:?} must use http or https")]
    UnsupportedScheme { url: String },
}

/// Where and how patiently the client talks to the backend.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    base_url: Url,
    request_timeout: Duration,
    chat_timeout: Duration,
    connect_timeout: Duration,
}

impl ClientSettings {
    pub fn new(base_url: &str) -> Result<Self, InvalidBaseUrl> {
        let trimmed = base_url.trim();
        let parsed = Url::parse(trimmed).map_err(|source| InvalidBaseUrl::Parse {
            url: trimmed.to_string(),
            source,
        })?;
        // http(s) URLs always have a hierarchical path, so endpoint segments can
        // be appended.
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(InvalidBaseUrl::UnsupportedScheme {
                url: trimmed.to_string(),
            });
        }

        Ok(Self {
            base_url: parsed,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            chat_timeout: MIN_CHAT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.request_timeout = timeout;
        }
        self
    }

    /// Set the chat timeout. Values below [`MIN_CHAT_TIMEOUT`] are raised to it.
    #[must_use]
    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout.max(MIN_CHAT_TIMEOUT);
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.connect_timeout = timeout;
        }
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn chat_timeout(&self) -> Duration {
        self.chat_timeout
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Absolute URL for `segments` below the base path. Segments are
    /// percent-encoded, so `/` inside an id stays inside its segment. A segment
    /// that is exactly `.` or `..` is dropped by URL normalization; callers
    /// must reject such ids before they get here.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ClientSettings, DEFAULT_BASE_URL, InvalidBaseUrl, MIN_CHAT_TIMEOUT};

    #[test]
    fn default_base_url_is_valid() {
        let settings = ClientSettings::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(settings.base_url().path(), "/api");
        assert_eq!(settings.chat_timeout(), MIN_CHAT_TIMEOUT);
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let settings = ClientSettings::new("http://localhost:8000/api").unwrap();
        assert_eq!(
            settings.endpoint(&["auth", "login"]).as_str(),
            "http://localhost:8000/api/auth/login"
        );
    }

    #[test]
    fn endpoint_handles_trailing_slash_and_bare_host() {
        let slashed = ClientSettings::new("http://localhost:8000/api/").unwrap();
        assert_eq!(
            slashed.endpoint(&["chat"]).as_str(),
            "http://localhost:8000/api/chat"
        );

        let bare = ClientSettings::new("http://localhost:8000").unwrap();
        assert_eq!(
            bare.endpoint(&["conversations"]).as_str(),
            "http://localhost:8000/conversations"
        );
    }

    #[test]
    fn endpoint_escapes_ids() {
        let settings = ClientSettings::new("http://localhost:8000/api").unwrap();
        assert_eq!(
            settings.endpoint(&["conversations", "../admin"]).path(),
            "/api/conversations/..%2Fadmin"
        );
    }

    #[test]
    fn endpoint_drops_dot_segments() {
        let settings = ClientSettings::new("http://localhost:8000/api").unwrap();
        assert_eq!(
            settings.endpoint(&["conversations", ".."]).path(),
            "/api/conversations"
        );
        assert_eq!(
            settings.endpoint(&["conversations", "."]).path(),
            "/api/conversations"
        );
    }

    #[test]
    fn chat_timeout_has_a_floor() {
        let settings = ClientSettings::new(DEFAULT_BASE_URL)
            .unwrap()
            .with_chat_timeout(Duration::from_secs(5));
        assert_eq!(settings.chat_timeout(), MIN_CHAT_TIMEOUT);

        let longer = ClientSettings::new(DEFAULT_BASE_URL)
            .unwrap()
            .with_chat_timeout(Duration::from_secs(300));
        assert_eq!(longer.chat_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn zero_request_timeout_is_ignored() {
        let settings = ClientSettings::new(DEFAULT_BASE_URL)
            .unwrap()
            .with_request_timeout(Duration::ZERO);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            ClientSettings::new("not a url"),
            Err(InvalidBaseUrl::Parse { .. })
        ));
        assert!(matches!(
            ClientSettings::new("mailto:someone@example.com"),
            Err(InvalidBaseUrl::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            ClientSettings::new("ftp://example.com/api"),
            Err(InvalidBaseUrl::UnsupportedScheme { .. })
        ));
    }
}
