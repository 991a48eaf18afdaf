//! State shared by the blocking and the async paged iterators.
//!
//! Both flavors run the same transition table: a pending request is fetched, the fetched page is
//! run through the policy and the cursor either moves to the next request or becomes exhausted.
//! Only the way the fetch is awaited differs, so everything else lives here.

pub mod cursor;

pub use cursor::Cursor;
