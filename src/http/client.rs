use super::{HttpError, HttpRequest};
use crate::PaginationPolicy;
use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Settings shared by every request of a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Used unless the request sets its own
    pub timeout: Duration,
    pub user_agent: String,
    /// Sent before the request's own headers
    pub default_headers: Vec<(String, String)>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("link-pager/{}", env!("CARGO_PKG_VERSION")),
            default_headers: Vec::new(),
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    fn headers<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.default_headers
            .iter()
            .chain(request.headers())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn timeout_for(&self, request: &HttpRequest) -> Duration {
        request.timeout_override().unwrap_or(self.timeout)
    }
}

#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Add a header sent with every request
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Async JSON page source.
///
/// Non-success statuses become [`HttpError::Status`] and bodies that don't decode into the page
/// type become [`HttpError::Decode`]. Nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HttpClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an already configured reqwest client, e.g. to share its connection pool.
    pub fn with_client(client: reqwest::Client, config: HttpClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Sends a single request and decodes the JSON body.
    pub async fn get_json<T>(&self, request: &HttpRequest) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = request.target()?;
        debug!(%url, "GET");

        let mut builder = self
            .client
            .get(url)
            .timeout(self.config.timeout_for(request))
            .header(USER_AGENT, self.config.user_agent.as_str());

        for (name, value) in self.config.headers(request) {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::status(status.as_u16(), body));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// See [`crate::mt::PageSource::pages`]
    #[cfg(feature = "mt")]
    pub fn pages<T, P>(
        &self,
        request: impl Into<HttpRequest>,
        policy: P,
    ) -> crate::mt::Pages<&Self, HttpRequest, T, P>
    where
        T: DeserializeOwned + Send,
        P: PaginationPolicy<T>,
        P::Location: Into<String>,
    {
        crate::mt::Pages::new(self, request, policy)
    }

    /// See [`crate::mt::PageSource::into_pages`]
    #[cfg(feature = "mt")]
    pub fn into_pages<T, P>(
        self,
        request: impl Into<HttpRequest>,
        policy: P,
    ) -> crate::mt::Pages<Self, HttpRequest, T, P>
    where
        T: DeserializeOwned + Send,
        P: PaginationPolicy<T>,
        P::Location: Into<String>,
    {
        crate::mt::Pages::new(self, request, policy)
    }
}

#[cfg(feature = "mt")]
impl<T> crate::mt::PageSource<HttpRequest, T> for HttpClient
where
    T: DeserializeOwned + Send,
{
    type Error = HttpError;

    async fn fetch_page(&self, request: &HttpRequest) -> Result<T, HttpError> {
        self.get_json(request).await
    }
}

/// Blocking JSON page source. Behaves exactly like [`HttpClient`].
///
/// reqwest's blocking client must not be created or used from within an async runtime, move
/// the pagination to a dedicated thread if you have to.
#[cfg(feature = "blocking")]
#[cfg_attr(docsrs, doc(cfg(feature = "blocking")))]
#[derive(Debug, Clone)]
pub struct BlockingHttpClient {
    client: reqwest::blocking::Client,
    config: HttpClientConfig,
}

#[cfg(feature = "blocking")]
impl Default for BlockingHttpClient {
    fn default() -> Self {
        Self::with_config(HttpClientConfig::default())
    }
}

#[cfg(feature = "blocking")]
impl BlockingHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HttpClientConfig) -> Self {
        Self::with_client(reqwest::blocking::Client::new(), config)
    }

    pub fn with_client(client: reqwest::blocking::Client, config: HttpClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    pub fn get_json<T>(&self, request: &HttpRequest) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = request.target()?;
        debug!(%url, "GET");

        let mut builder = self
            .client
            .get(url)
            .timeout(self.config.timeout_for(request))
            .header(USER_AGENT, self.config.user_agent.as_str());

        for (name, value) in self.config.headers(request) {
            builder = builder.header(name, value);
        }

        let response = builder.send()?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(HttpError::status(status.as_u16(), body));
        }

        let body = response.bytes()?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// See [`crate::blocking::PageSource::pages`]
    pub fn pages<T, P>(
        &self,
        request: impl Into<HttpRequest>,
        policy: P,
    ) -> crate::blocking::Pages<&Self, HttpRequest, T, P>
    where
        T: DeserializeOwned,
        P: PaginationPolicy<T>,
        P::Location: Into<String>,
    {
        crate::blocking::Pages::new(self, request, policy)
    }

    /// See [`crate::blocking::PageSource::into_pages`]
    pub fn into_pages<T, P>(
        self,
        request: impl Into<HttpRequest>,
        policy: P,
    ) -> crate::blocking::Pages<Self, HttpRequest, T, P>
    where
        T: DeserializeOwned,
        P: PaginationPolicy<T>,
        P::Location: Into<String>,
    {
        crate::blocking::Pages::new(self, request, policy)
    }
}

#[cfg(feature = "blocking")]
impl<T> crate::blocking::PageSource<HttpRequest, T> for BlockingHttpClient
where
    T: DeserializeOwned,
{
    type Error = HttpError;

    fn fetch_page(&self, request: &HttpRequest) -> Result<T, HttpError> {
        self.get_json(request)
    }
}
