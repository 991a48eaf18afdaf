#![cfg_attr(docsrs, feature(doc_cfg))]
//! Lazy iteration over paginated APIs where every page tells you where the next one lives.
//!
//! A lot of HTTP APIs answer with a batch of records plus a link, a cursor or a "next" field
//! pointing at the following page. Walking such an API by hand means writing a loop that issues a
//! request, decodes the body, digs out the next location, builds another request and stops when the
//! location runs dry. This crate owns that loop.
//!
//! You provide two things:
//!
//! - a page source, the thing that can turn a request into a decoded page. Implement
//!   [`PageSource`] for async clients or [`blocking::PageSource`] for blocking ones, or enable the
//!   `http` feature and use the bundled reqwest clients.
//! - a [`PaginationPolicy`], usually just a closure `|page: &MyPage| page.next.clone()`. Returning
//!   `None` or a blank location ends the pagination.
//!
//! ```ignore
//! use link_pager::prelude::*;
//!
//! #[derive(serde::Deserialize)]
//! struct Listing {
//!     items: Vec<Repo>,
//!     next: Option<String>,
//! }
//!
//! let client = HttpClient::new();
//! let mut pages = client.pages("https://api.example.com/repos", |page: &Listing| page.next.clone());
//!
//! while pages.advance(&()).await? {
//!     for repo in &pages.current()?.items {
//!         println!("{}", repo.name);
//!     }
//! }
//! ```
//!
//! Pages are fetched strictly one after another and only on demand. Nothing is prefetched, cached
//! or retried. A failed fetch leaves the iterator where it was, so calling `advance` again retries
//! the very same request.

pub mod cancel;
pub mod error;

#[cfg(feature = "blocking")]
#[cfg_attr(docsrs, doc(cfg(feature = "blocking")))]
pub mod blocking;

#[cfg(feature = "mt")]
pub mod mt;

#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub mod http;

#[cfg(feature = "dynamic")]
#[cfg_attr(docsrs, doc(cfg(feature = "dynamic")))]
pub use mt::dynamic;

// `mt` is enabled by default so the root prelude reexports the mt::prelude. Blocking users import
// `link_pager::blocking::prelude::*` instead.
#[cfg(feature = "mt")]
pub mod prelude {
    //! Everything needed to implement a page source and walk its pages.
    pub use crate::mt::prelude::*;
}

// `mt` is enabled by default so it's reexported into the root.
#[cfg(feature = "mt")]
pub use crate::mt::*;

pub use cancel::{CancelSignal, CancelToken};
pub use error::{Error, UsageError};

use std::borrow::Cow;

/// A value a request can be pointed at: a URL, a path, a cursor, a page number.
///
/// The only thing pagination needs to know about a location is whether it's blank. A blank
/// location terminates the pagination exactly like `None` does, so APIs answering with
/// `"next": ""` on the last page work out of the box.
pub trait Location {
    fn is_blank(&self) -> bool;
}

impl Location for str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Location for String {
    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

impl Location for Box<str> {
    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

impl Location for Cow<'_, str> {
    fn is_blank(&self) -> bool {
        self.as_ref().is_blank()
    }
}

impl<L> Location for &L
where
    L: ?Sized + Location,
{
    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

#[cfg(feature = "http")]
impl Location for url::Url {
    fn is_blank(&self) -> bool {
        false
    }
}

macro_rules! never_blank_location {
    ($($ty:ty),*) => {
        $(
            impl Location for $ty {
                fn is_blank(&self) -> bool {
                    false
                }
            }
        )*
    };
}

never_blank_location!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// A request that is ready to be issued.
///
/// Besides the target location a request usually carries configuration the caller set up before
/// iterating: headers, credentials, timeouts. [`RequestHandle::follow`] derives the request for
/// the next page and is expected to carry that configuration over.
pub trait RequestHandle: Sized {
    type Location;

    /// Builds the request for `location` inheriting the configuration of `self`.
    fn follow(&self, location: Self::Location) -> Self;
}

/// Decides where the next page lives by looking at the current one.
///
/// Return `None` (or a blank [`Location`]) to stop. The policy should be pure: it's applied
/// exactly once per fetched page and its answer is never second-guessed. If a page looks
/// malformed and pagination can't continue, return `None` rather than panicking.
///
/// Any `Fn(&T) -> Option<L>` is a policy, so a closure is all you need most of the time.
pub trait PaginationPolicy<T> {
    type Location: Location;

    fn next_location(&self, page: &T) -> Option<Self::Location>;
}

impl<T, F, L> PaginationPolicy<T> for F
where
    F: Fn(&T) -> Option<L>,
    L: Location,
{
    type Location = L;

    fn next_location(&self, page: &T) -> Option<L> {
        self(page)
    }
}

mod internal;

#[cfg(test)]
mod test_utils;
