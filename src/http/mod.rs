//! Ready-made page sources for JSON APIs on top of [reqwest].
//!
//! [`HttpClient`] implements [`crate::mt::PageSource`] and [`BlockingHttpClient`] implements
//! [`crate::blocking::PageSource`] for any `T: DeserializeOwned`, with [`HttpRequest`] as the
//! request handle. Next links returned by the policy may be absolute or relative to the URL of
//! the page they came from.
//!
//! ```ignore
//! use link_pager::http::{HttpRequest, Paged};
//!
//! let request = HttpRequest::new("https://api.example.com/repos").bearer_auth(token);
//! let mut pages = request.paged(|page: &Listing| page.next.clone());
//!
//! while pages.advance(&()).await? {
//!     process(pages.current()?);
//! }
//! ```

mod client;
mod request;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use request::HttpRequest;

#[cfg(feature = "blocking")]
pub use client::BlockingHttpClient;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why an HTTP page couldn't be fetched
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode the page: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl HttpError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// The status code of a non-success response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::Decode(_) | Self::InvalidUrl(_) => None,
        }
    }
}

/// Start paginating right from a URL or a request with a default client.
///
/// ```ignore
/// let pages = "https://api.example.com/repos".paged(|page: &Listing| page.next.clone());
/// ```
pub trait Paged: Into<HttpRequest> + Sized {
    #[cfg(feature = "mt")]
    #[cfg_attr(docsrs, doc(cfg(feature = "mt")))]
    fn paged<T, P>(self, policy: P) -> crate::mt::Pages<HttpClient, HttpRequest, T, P>
    where
        T: DeserializeOwned + Send,
        P: crate::PaginationPolicy<T>,
        P::Location: Into<String>,
    {
        HttpClient::new().into_pages(self, policy)
    }

    /// Don't call it from within an async runtime, reqwest's blocking client refuses to work
    /// there.
    #[cfg(feature = "blocking")]
    #[cfg_attr(docsrs, doc(cfg(feature = "blocking")))]
    fn paged_blocking<T, P>(
        self,
        policy: P,
    ) -> crate::blocking::Pages<BlockingHttpClient, HttpRequest, T, P>
    where
        T: DeserializeOwned,
        P: crate::PaginationPolicy<T>,
        P::Location: Into<String>,
    {
        BlockingHttpClient::new().into_pages(self, policy)
    }
}

impl<Q> Paged for Q where Q: Into<HttpRequest> {}
