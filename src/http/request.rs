//! The request handle used by the bundled HTTP clients.

use super::HttpError;
use crate::RequestHandle;
use std::time::Duration;
use url::Url;

/// A GET request ready to be sent by [`super::HttpClient`] or [`super::BlockingHttpClient`].
///
/// The URL is kept as given and parsed only when the request is sent, so an invalid URL surfaces
/// as [`HttpError::InvalidUrl`] from the fetch instead of from the constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    url: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            timeout: None,
        }
    }

    /// Add a header. Headers are carried over to the following pages.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add an `Authorization: Bearer` header
    #[must_use]
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("authorization", value)
    }

    /// Add a query parameter to this request only. Next links carry their own query.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Override the client timeout. Carried over to the following pages.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    /// The URL to send the request to, query parameters included.
    pub fn target(&self) -> Result<Url, HttpError> {
        let mut url = Url::parse(&self.url)?;

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        Ok(url)
    }
}

impl RequestHandle for HttpRequest {
    type Location = String;

    /// Next links relative to the current URL are resolved against it.
    fn follow(&self, location: String) -> Self {
        let url = match Url::parse(&self.url) {
            Ok(base) => base
                .join(&location)
                .map(String::from)
                .unwrap_or(location),
            Err(_) => location,
        };

        Self {
            url,
            headers: self.headers.clone(),
            query: Vec::new(),
            timeout: self.timeout,
        }
    }
}

impl From<&str> for HttpRequest {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for HttpRequest {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl From<Url> for HttpRequest {
    fn from(url: Url) -> Self {
        Self::new(url)
    }
}

impl From<&Url> for HttpRequest {
    fn from(url: &Url) -> Self {
        Self::new(url.as_str())
    }
}
