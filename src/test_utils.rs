use crate::RequestHandle;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

pub const TOKEN: &str = "secret";

/// A page of a listing. `next` is the path of the following page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub items: Vec<u32>,
    pub next: Option<String>,
}

impl Listing {
    pub fn new(items: &[u32], next: Option<&str>) -> Self {
        Self {
            items: items.to_vec(),
            next: next.map(str::to_owned),
        }
    }
}

pub fn next_link(listing: &Listing) -> Option<String> {
    listing.next.clone()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub path: String,
    pub token: String,
}

impl From<&str> for ListingRequest {
    fn from(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            token: TOKEN.to_owned(),
        }
    }
}

impl RequestHandle for ListingRequest {
    type Location = String;

    fn follow(&self, location: String) -> Self {
        Self {
            path: location,
            token: self.token.clone(),
        }
    }
}

/// An in-memory API serving linked listing pages
#[derive(Debug, Default)]
pub struct ListingServer {
    pages: HashMap<String, Listing>,
    failures: Mutex<HashMap<String, usize>>,
    requests: Mutex<Vec<String>>,
}

impl ListingServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, path: &str, items: &[u32], next: Option<&str>) -> Self {
        self.pages.insert(path.to_owned(), Listing::new(items, next));
        self
    }

    /// Two linked pages: `[1, 2] -> p2 -> [3]`
    pub fn two_pages() -> Self {
        Self::new()
            .page("p1", &[1, 2], Some("p2"))
            .page("p2", &[3], None)
    }

    /// Chains `count` pages `p1 -> p2 -> ... -> p{count}` with `page_size` items each
    pub fn chain(count: usize, page_size: u32) -> Self {
        (1..=count).fold(Self::new(), |server, n| {
            let first = (n as u32 - 1) * page_size + 1;
            let items: Vec<_> = (first..first + page_size).collect();
            let next = (n < count).then(|| format!("p{}", n + 1));

            server.page(&format!("p{n}"), &items, next.as_deref())
        })
    }

    /// Makes the next `times` requests to `path` fail
    pub fn fail_next(&self, path: &str, times: usize) {
        self.failures
            .lock()
            .unwrap()
            .insert(path.to_owned(), times);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn get(&self, request: &ListingRequest) -> Result<Listing, String> {
        self.requests.lock().unwrap().push(request.path.clone());

        if request.token != TOKEN {
            return Err("unauthorized".to_owned());
        }

        if let Some(left) = self.failures.lock().unwrap().get_mut(&request.path) {
            if *left > 0 {
                *left -= 1;
                return Err("connection reset".to_owned());
            }
        }

        self.pages
            .get(&request.path)
            .cloned()
            .ok_or_else(|| format!("not found: {}", request.path))
    }
}

/// A page of an endless feed addressed by page numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPage {
    pub number: usize,
    pub item: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(pub usize);

impl From<usize> for PageNumber {
    fn from(number: usize) -> Self {
        Self(number)
    }
}

impl RequestHandle for PageNumber {
    type Location = usize;

    fn follow(&self, location: usize) -> Self {
        Self(location)
    }
}

/// Serves an infinite feed. Page `n` holds `n * n`.
#[derive(Debug, Default)]
pub struct EndlessFeed {
    pub fetches: AtomicUsize,
}

impl EndlessFeed {
    pub fn get(&self, request: &PageNumber) -> FeedPage {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        FeedPage {
            number: request.0,
            item: request.0 * request.0,
        }
    }
}

/// What a client would compute by hand: starting from `first` repeatedly apply the policy
pub fn simulate_feed(first: usize, count: usize) -> Vec<FeedPage> {
    std::iter::successors(Some(first), |number| Some(number + 1))
        .take(count)
        .map(|number| FeedPage {
            number,
            item: number * number,
        })
        .collect()
}

macro_rules! listing_server_page_source_impl {
    (blocking) => {
        impl crate::blocking::PageSource<ListingRequest, Listing> for ListingServer {
            type Error = String;

            fn fetch_page(&self, request: &ListingRequest) -> Result<Listing, String> {
                self.get(request)
            }
        }

        impl crate::blocking::PageSource<PageNumber, FeedPage> for EndlessFeed {
            type Error = std::convert::Infallible;

            fn fetch_page(&self, request: &PageNumber) -> Result<FeedPage, Self::Error> {
                Ok(self.get(request))
            }
        }
    };
    (mt) => {
        impl crate::mt::PageSource<ListingRequest, Listing> for ListingServer {
            type Error = String;

            async fn fetch_page(&self, request: &ListingRequest) -> Result<Listing, String> {
                if request.path.starts_with("slow") {
                    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                }

                self.get(request)
            }
        }

        impl crate::mt::PageSource<PageNumber, FeedPage> for EndlessFeed {
            type Error = std::convert::Infallible;

            async fn fetch_page(&self, request: &PageNumber) -> Result<FeedPage, Self::Error> {
                tokio::task::yield_now().await;
                Ok(self.get(request))
            }
        }
    };
}

#[cfg(feature = "blocking")]
listing_server_page_source_impl!(blocking);

#[cfg(feature = "mt")]
listing_server_page_source_impl!(mt);
