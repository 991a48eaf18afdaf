//! Async paged iteration suitable for multithreaded executors. This is what you need in most cases.
//! See [`dynamic`] if you also need `dyn PageSource` objects for some reason.

use crate::internal::Cursor;
use futures::{
    future::{self, Either},
    stream::{self, Stream, TryStreamExt},
};
use std::{future::Future, pin::pin};
use tracing::{debug, trace};

pub use crate::{
    CancelSignal, CancelToken, Error, Location, PaginationPolicy, RequestHandle, UsageError,
};

pub mod prelude {
    pub use super::{
        CancelSignal, CancelToken, Error, Location, PageError, PageSource, Pages,
        PaginationPolicy, RequestHandle, UsageError,
    };
}

/// Shortcut for the error type of a page source.
pub type PageError<S, R, T> = <S as PageSource<R, T>>::Error;

/// Fetches a single page. Implement it for your async client.
///
/// The source performs the whole exchange: it sends the request, checks the response and decodes
/// the body into `T`. Network failures, unexpected statuses and decoding failures are all reported
/// through [`PageSource::Error`]. Don't retry here unless you want retries, the paged iterators
/// never retry on their own.
///
/// Dropping the returned future must abort the exchange without side effects on the caller's
/// state, this is how in-flight cancellation is delivered.
pub trait PageSource<R, T>: Send + Sync
where
    R: Send + Sync,
{
    type Error: Send;

    fn fetch_page(&self, request: &R) -> impl Send + Future<Output = Result<T, Self::Error>>;

    /// Returns a lazy paged iterator borrowing the source. Nothing is fetched until the first
    /// [`Pages::advance`].
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
    D: Send + Sync + std::ops::Deref<Target = S>,
    S: ?Sized + PageSource<R, T>,
    R: Send + Sync,
{
    type Error = PageError<S, R, T>;

    async fn fetch_page(&self, request: &R) -> Result<T, Self::Error> {
        self.deref().fetch_page(request).await
    }
}

/// A single-pass async iterator over pages linked to each other.
///
/// Drive it with [`Pages::advance`] and read the page with [`Pages::current`], or turn it into a
/// [`Stream`] with [`Pages::into_stream`]. Each successful `advance` performs exactly one fetch.
/// The iterator ends once the policy stops producing locations; if it never does, neither does the
/// iterator.
///
/// `advance` takes `&mut self` so only one fetch can be in flight per iterator.
pub struct Pages<S, R, T, P> {
    source: S,
    policy: P,
    cursor: Cursor<R>,
    current: Option<T>,
    fetched: usize,
    closed: bool,
}

impl<S, R, T, P> Pages<S, R, T, P>
where
    S: PageSource<R, T>,
    R: Send + Sync + RequestHandle,
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
            closed: false,
        }
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(true)` when a new page is available through [`Pages::current`] and `Ok(false)`
    /// when the pagination is over or `cancel` was already active. A cancelled `advance` doesn't
    /// consume the pending request, a later call with an inactive signal fetches it.
    ///
    /// If `cancel` fires while the page is in flight the fetch is dropped and
    /// [`Error::Cancelled`] is returned. On any error the pending request is kept and the next
    /// call retries it.
    pub async fn advance<C>(&mut self, cancel: &C) -> Result<bool, Error<PageError<S, R, T>>>
    where
        C: ?Sized + CancelSignal,
    {
        match self.next_page(cancel).await {
            Ok(Some(page)) => {
                self.current = Some(page);
                Ok(true)
            }
            Ok(None) => {
                self.current = None;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// The page fetched by the last successful [`Pages::advance`].
    pub fn current(&self) -> Result<&T, Error<PageError<S, R, T>>> {
        if self.closed {
            return Err(UsageError::Closed.into());
        }

        self.current
            .as_ref()
            .ok_or(Error::Usage(UsageError::NoCurrentPage))
    }

    /// Takes the current page out of the iterator. Subsequent [`Pages::current`] calls fail until
    /// the next successful advance.
    pub fn take_current(&mut self) -> Result<T, Error<PageError<S, R, T>>> {
        if self.closed {
            return Err(UsageError::Closed.into());
        }

        self.current
            .take()
            .ok_or(Error::Usage(UsageError::NoCurrentPage))
    }

    /// Always fails. Paged iterators are single-pass, build a new one to start over.
    pub fn reset(&mut self) -> Result<(), Error<PageError<S, R, T>>> {
        Err(UsageError::Reset.into())
    }

    /// Releases the iterator. Further advances fail with [`UsageError::Closed`].
    ///
    /// There is nothing to tear down, closing only marks the iterator unusable. It's idempotent.
    pub fn close(&mut self) {
        self.closed = true;
        self.current = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the policy has already ended the pagination.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }

    /// The request the next advance is going to issue.
    pub fn pending_request(&self) -> Option<&R> {
        self.cursor.pending()
    }

    /// How many pages were fetched successfully so far.
    pub fn fetched_pages(&self) -> usize {
        self.fetched
    }

    /// Converts the iterator into a stream of pages. The stream ends after the first error, when
    /// the pagination is over, or when `cancel` is active before a fetch.
    pub fn into_stream<C>(
        self,
        cancel: C,
    ) -> impl Send + Stream<Item = Result<T, Error<PageError<S, R, T>>>>
    where
        C: CancelSignal + Send,
        T: Send,
        P: Send,
    {
        stream::try_unfold((self, cancel), request_next_page)
    }

    /// A stream of individual items. `extract` splits every page into its items.
    pub fn items_with<C, F, I>(
        self,
        cancel: C,
        extract: F,
    ) -> impl Send + Stream<Item = Result<I::Item, Error<PageError<S, R, T>>>>
    where
        C: CancelSignal + Send,
        T: Send,
        P: Send,
        F: Send + FnMut(T) -> I,
        I: IntoIterator,
        I::IntoIter: Send,
        I::Item: Send,
    {
        let mut extract = extract;

        self.into_stream(cancel)
            .map_ok(move |page| stream::iter(extract(page).into_iter().map(Ok)))
            .try_flatten()
    }

    async fn next_page<C>(&mut self, cancel: &C) -> Result<Option<T>, Error<PageError<S, R, T>>>
    where
        C: ?Sized + CancelSignal,
    {
        if self.closed {
            return Err(UsageError::Closed.into());
        }

        let request = match self.cursor.pending() {
            Some(request) => request,
            None => return Ok(None),
        };

        if cancel.is_cancelled() {
            debug!(fetched = self.fetched, "pagination cancelled before fetching the next page");
            return Ok(None);
        }

        let page = {
            let fetch = pin!(self.source.fetch_page(request));
            let cancelled = pin!(cancel.cancelled());

            match future::select(fetch, cancelled).await {
                Either::Left((page, _)) => page.map_err(Error::Fetch)?,
                Either::Right(((), _)) => {
                    debug!(fetched = self.fetched, "in-flight page fetch cancelled");
                    return Err(Error::Cancelled);
                }
            }
        };

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

impl<S, R, T, P> std::fmt::Debug for Pages<S, R, T, P>
where
    R: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pages")
            .field("cursor", &self.cursor)
            .field("fetched", &self.fetched)
            .field("has_current", &self.current.is_some())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

async fn request_next_page<S, R, T, P, C>(
    (mut pages, cancel): (Pages<S, R, T, P>, C),
) -> Result<Option<(T, (Pages<S, R, T, P>, C))>, Error<PageError<S, R, T>>>
where
    S: PageSource<R, T>,
    R: Send + Sync + RequestHandle,
    P: PaginationPolicy<T>,
    P::Location: Into<R::Location>,
    C: CancelSignal,
{
    match pages.next_page(&cancel).await? {
        Some(page) => Ok(Some((page, (pages, cancel)))),
        None => Ok(None),
    }
}

#[cfg(feature = "dynamic")]
#[cfg_attr(docsrs, doc(cfg(feature = "dynamic")))]
pub mod dynamic {
    //! An object safe page source that can be used as a `dyn` object. Requires `#[async_trait]`
    //! to be implemented.

    use async_trait::async_trait;

    pub use super::{PageSource, Pages};

    pub mod prelude {
        pub use super::{DynPageSource, PageSource, Pages};
        pub use crate::mt::prelude::*;
    }

    /// An object safe flavor of [`PageSource`]. `Arc<dyn DynPageSource<R, T, Error = E>>` and
    /// `Box<dyn ..>` are page sources themselves so they can be paginated directly.
    #[async_trait]
    pub trait DynPageSource<R, T>: Send + Sync
    where
        R: 'static + Send + Sync,
    {
        type Error: 'static + Send;

        async fn fetch_page(&self, request: &R) -> Result<T, Self::Error>;
    }

    impl<R, T, E> PageSource<R, T> for dyn DynPageSource<R, T, Error = E> + '_
    where
        R: 'static + Send + Sync,
        E: 'static + Send,
    {
        type Error = E;

        async fn fetch_page(&self, request: &R) -> Result<T, E> {
            DynPageSource::fetch_page(self, request).await
        }
    }
}
