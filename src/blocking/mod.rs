//! Blocking paged iteration. Every step performs the whole request/response cycle on the calling
//! thread before returning.
//!
//! This flavor talks to blocking page sources directly. It never drives an async source to
//! completion from the inside, so it's safe to use from any thread that is allowed to block.

use crate::internal::Cursor;
use std::iter::FusedIterator;
use tracing::{debug, trace};

pub use crate::{Error, Location, PaginationPolicy, RequestHandle, UsageError};

pub mod prelude {
    pub use super::{
        Error, Location, PageError, PageSource, Pages, PaginationPolicy, RequestHandle,
        UsageError,
    };
}

/// Shortcut for the error type of a blocking page source.
pub type PageError<S, R, T> = <S as PageSource<R, T>>::Error;

/// Fetches a single page, blocking the calling thread until it's decoded. Implement it for your
/// blocking client.
///
/// See [`crate::PageSource`] for the contract, it's the same apart from blocking.
pub trait PageSource<R, T> {
    type Error;

    fn fetch_page(&self, request: &R) -> Result<T, Self::Error>;

    /// Returns a lazy paged iterator borrowing the source. Nothing is fetched until the first
    /// [`Pages::advance`] or [`Iterator::next`].
    ///
    /// `request` is either a location the request type converts from or a fully built request.
    fn pages<P>(&self, request: impl Into<R>, policy: P) -> Pages<&Self, R, T, P>
    where
        Self: Sized,
        R: RequestHandle,
        P: PaginationPolicy<T>,
        P::Location: Into<R::Location>,
    {
        Pages::new(self, request, policy)
    }

    /// The same as [`PageSource::pages`] but takes the source by value.
    fn into_pages<P>(self, request: impl Into<R>, policy: P) -> Pages<Self, R, T, P>
    where
        Self: Sized,
        R: RequestHandle,
        P: PaginationPolicy<T>,
        P::Location: Into<R::Location>,
    {
        Pages::new(self, request, policy)
    }
}

impl<D, S, R, T> PageSource<R, T> for D
where
    D: std::ops::Deref<Target = S>,
    S: ?Sized + PageSource<R, T>,
{
    type Error = PageError<S, R, T>;

    fn fetch_page(&self, request: &R) -> Result<T, Self::Error> {
        self.deref().fetch_page(request)
    }
}

/// A single-pass blocking iterator over pages linked to each other.
///
/// Use it as a regular [`Iterator`] of `Result<T, Error<_>>` or drive it by hand with
/// [`Pages::advance`] and [`Pages::current`]. Errors don't end the iteration: the failed request
/// stays pending and the next call retries it, so don't blindly `for`-loop over a source that keeps
/// failing.
pub struct Pages<S, R, T, P> {
    source: S,
    policy: P,
    cursor: Cursor<R>,
    current: Option<T>,
    fetched: usize,
}

impl<S, R, T, P> Pages<S, R, T, P>
where
    S: PageSource<R, T>,
    R: RequestHandle,
    P: PaginationPolicy<T>,
    P::Location: Into<R::Location>,
{
    pub fn new(source: S, request: impl Into<R>, policy: P) -> Self {
        Self {
            source,
            policy,
            cursor: Cursor::new(request.into()),
            current: None,
            fetched: 0,
        }
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(true)` when a new page is available through [`Pages::current`] and `Ok(false)`
    /// once the pagination is over, without touching the network. On error the pending request is
    /// kept and the next call retries it.
    pub fn advance(&mut self) -> Result<bool, Error<PageError<S, R, T>>> {
        match self.next_page()? {
            Some(page) => {
                self.current = Some(page);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    /// The page fetched by the last successful [`Pages::advance`].
    pub fn current(&self) -> Result<&T, Error<PageError<S, R, T>>> {
        self.current
            .as_ref()
            .ok_or(Error::Usage(UsageError::NoCurrentPage))
    }

    pub fn take_current(&mut self) -> Result<T, Error<PageError<S, R, T>>> {
        self.current
            .take()
            .ok_or(Error::Usage(UsageError::NoCurrentPage))
    }

    /// Always fails. Paged iterators are single-pass, build a new one to start over.
    pub fn reset(&mut self) -> Result<(), Error<PageError<S, R, T>>> {
        Err(UsageError::Reset.into())
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }

    /// The request the next advance is going to issue.
    pub fn pending_request(&self) -> Option<&R> {
        self.cursor.pending()
    }

    pub fn fetched_pages(&self) -> usize {
        self.fetched
    }

    /// An iterator of individual items. `extract` splits every page into its items.
    pub fn items_with<F, I>(
        self,
        extract: F,
    ) -> impl Iterator<Item = Result<I::Item, Error<PageError<S, R, T>>>>
    where
        F: FnMut(T) -> I,
        I: IntoIterator,
    {
        let mut extract = extract;

        self.flat_map(move |page| {
            let (items, err) = match page {
                Ok(page) => (Some(extract(page)), None),
                Err(err) => (None, Some(err)),
            };

            items.into_iter().flatten().map(Ok).chain(err.map(Err))
        })
    }

    fn next_page(&mut self) -> Result<Option<T>, Error<PageError<S, R, T>>> {
        let request = match self.cursor.pending() {
            Some(request) => request,
            None => return Ok(None),
        };

        let page = self.source.fetch_page(request).map_err(Error::Fetch)?;

        self.fetched += 1;
        self.cursor.turn(&page, &self.policy);

        if self.cursor.is_exhausted() {
            debug!(fetched = self.fetched, "pagination finished");
        } else {
            trace!(fetched = self.fetched, "page fetched, next request is pending");
        }

        Ok(Some(page))
    }
}

impl<S, R, T, P> Iterator for Pages<S, R, T, P>
where
    S: PageSource<R, T>,
    R: RequestHandle,
    P: PaginationPolicy<T>,
    P::Location: Into<R::Location>,
{
    type Item = Result<T, Error<PageError<S, R, T>>>;

    /// Pages yielded here are handed out by value, so [`Pages::current`] is cleared.
    fn next(&mut self) -> Option<Self::Item> {
        self.current = None;
        self.next_page().transpose()
    }
}

impl<S, R, T, P> FusedIterator for Pages<S, R, T, P>
where
    S: PageSource<R, T>,
    R: RequestHandle,
    P: PaginationPolicy<T>,
    P::Location: Into<R::Location>,
{
}

impl<S, R, T, P> std::fmt::Debug for Pages<S, R, T, P>
where
    R: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pages")
            .field("cursor", &self.cursor)
            .field("fetched", &self.fetched)
            .field("has_current", &self.current.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
