//! Error types returned by paged iterators.
//!
//! The iterators never retry, never log and never swallow errors. Whatever the page source fails
//! with is handed back as [`Error::Fetch`] and the iterator keeps the request that failed, so the
//! caller decides whether to try again.

use thiserror::Error;

/// Errors produced while advancing a paged iterator.
///
/// `E` is the error type of the page source. Transport and decoding failures both live there.
#[derive(Error, Debug)]
pub enum Error<E> {
    /// The page source failed to fetch or decode a page. The pending request is kept.
    #[error("failed to fetch the page: {0}")]
    Fetch(#[source] E),

    /// The cancellation signal fired while a page was in flight. The pending request is kept.
    #[error("pagination was cancelled while a page was in flight")]
    Cancelled,

    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl<E> Error<E> {
    /// Returns the page source error if this is one.
    pub fn into_fetch(self) -> Option<E> {
        match self {
            Self::Fetch(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

/// The iterator was used in a way it doesn't support. These never touch the network.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    #[error("paged iterators are single-pass and cannot be reset")]
    Reset,

    #[error("there is no current page, advance must return true first")]
    NoCurrentPage,

    #[error("the paged iterator was closed")]
    Closed,
}

/// Result type alias for paged iterator operations
pub type Result<T, E> = std::result::Result<T, Error<E>>;
