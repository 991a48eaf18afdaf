use crate::{Location, PaginationPolicy, RequestHandle};

/// The only mutable state of a paged iterator: the request to issue next, if any.
#[derive(Debug)]
pub enum Cursor<R> {
    Pending(R),
    Exhausted,
}

impl<R> Cursor<R> {
    pub fn new(request: R) -> Self {
        Self::Pending(request)
    }

    pub fn pending(&self) -> Option<&R> {
        match self {
            Self::Pending(request) => Some(request),
            Self::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl<R> Cursor<R>
where
    R: RequestHandle,
{
    /// Moves the cursor past a successfully fetched `page`.
    ///
    /// Must only be called with the page returned for the currently pending request. Does nothing
    /// on an exhausted cursor.
    pub fn turn<T, P>(&mut self, page: &T, policy: &P)
    where
        P: PaginationPolicy<T>,
        P::Location: Into<R::Location>,
    {
        let Self::Pending(current) = self else {
            return;
        };

        *self = match policy
            .next_location(page)
            .filter(|location| !location.is_blank())
        {
            Some(location) => Self::Pending(current.follow(location.into())),
            None => Self::Exhausted,
        };
    }
}
