use crate::blocking::prelude::*;
use crate::test_utils::*;
use std::sync::{atomic::Ordering, Arc};

#[test]
fn yields_whole_pages_until_next_runs_out() {
    let server = ListingServer::two_pages();
    let mut pages = server.pages("p1", next_link);

    assert!(pages.advance().unwrap());
    assert_eq!(pages.current().unwrap(), &Listing::new(&[1, 2], Some("p2")));

    assert!(pages.advance().unwrap());
    assert_eq!(pages.current().unwrap(), &Listing::new(&[3], None));

    assert!(!pages.advance().unwrap());
    assert!(!pages.advance().unwrap());
    assert!(pages.is_exhausted());

    assert_eq!(server.requests(), ["p1", "p2"], "Exhausted advances must not fetch");
}

#[test]
fn yields_exactly_as_many_pages_as_the_policy_allows() {
    for count in [1, 2, 7] {
        let server = ListingServer::chain(count, 3);
        let mut pages = server.pages("p1", next_link);

        let collected: Vec<_> = pages.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(collected.len(), count);

        for _ in 0..3 {
            assert!(pages.next().is_none());
            assert!(!pages.advance().unwrap());
        }

        assert_eq!(server.requests().len(), count);
    }
}

#[test]
fn blank_next_location_terminates() {
    for next in ["", " \t"] {
        let server = ListingServer::new().page("p1", &[1], Some(next));
        let pages: Vec<_> = server
            .pages("p1", next_link)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(pages, [Listing::new(&[1], Some(next))]);
        assert_eq!(server.requests(), ["p1"]);
    }
}

#[test]
fn endless_policy_matches_forward_simulation() {
    let feed = EndlessFeed::default();

    for take in [1, 5, 25] {
        let pages: Vec<_> = feed
            .pages(PageNumber(3), |page: &FeedPage| Some(page.number + 1))
            .take(take)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(pages, simulate_feed(3, take));
    }

    assert_eq!(feed.fetches.load(Ordering::SeqCst), 31);
}

#[test]
fn current_requires_a_successful_advance() {
    let server = ListingServer::two_pages();
    let mut pages = server.pages("p1", next_link);

    assert!(matches!(
        pages.current(),
        Err(Error::Usage(UsageError::NoCurrentPage))
    ));
    assert!(matches!(
        pages.take_current(),
        Err(Error::Usage(UsageError::NoCurrentPage))
    ));

    assert!(pages.advance().unwrap());
    assert_eq!(pages.take_current().unwrap().items, [1, 2]);
    assert!(pages.current().is_err());
}

#[test]
fn next_does_not_leave_a_stale_current_page() {
    let server = ListingServer::chain(3, 1);
    let mut pages = server.pages("p1", next_link);

    assert!(pages.advance().unwrap());
    assert_eq!(pages.current().unwrap().items, [1]);

    assert_eq!(pages.next().unwrap().unwrap().items, [2]);
    assert!(matches!(
        pages.current(),
        Err(Error::Usage(UsageError::NoCurrentPage))
    ));

    assert_eq!(pages.next().unwrap().unwrap().items, [3]);
    assert!(pages.next().is_none());
    assert!(pages.is_exhausted());
    assert!(pages.current().is_err());
}

#[test]
fn reset_is_always_rejected() {
    let server = ListingServer::two_pages();
    let mut pages = server.pages("p1", next_link);

    assert!(matches!(pages.reset(), Err(Error::Usage(UsageError::Reset))));

    pages.advance().unwrap();
    assert!(matches!(pages.reset(), Err(Error::Usage(UsageError::Reset))));

    while pages.advance().unwrap() {}
    assert!(matches!(pages.reset(), Err(Error::Usage(UsageError::Reset))));
}

#[test]
fn failed_fetch_is_retried_on_the_next_call() {
    let server = ListingServer::two_pages();
    server.fail_next("p1", 1);

    let mut pages = server.pages("p1", next_link);

    match pages.next() {
        Some(Err(Error::Fetch(err))) => assert_eq!(err, "connection reset"),
        other => panic!("Expected a fetch error, got {other:?}"),
    }

    assert_eq!(pages.pending_request(), Some(&ListingRequest::from("p1")));

    let page = pages.next().unwrap().unwrap();
    assert_eq!(page, Listing::new(&[1, 2], Some("p2")));
    assert_eq!(server.requests(), ["p1", "p1"]);
}

#[test]
fn followed_requests_inherit_configuration() {
    let server = ListingServer::chain(3, 1);

    let pages: Vec<_> = server
        .pages("p1", next_link)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(pages.len(), 3);

    let forged = ListingRequest {
        path: "p1".to_owned(),
        token: String::new(),
    };

    let mut pages = server.pages(forged, next_link);
    assert_eq!(pages.next().unwrap().unwrap_err().into_fetch().unwrap(), "unauthorized");
}

#[test]
fn items_are_flattened_in_order() {
    let server = Arc::new(ListingServer::chain(5, 4));
    let expected: Vec<u32> = (1..=20).collect();

    let items: Vec<_> = server
        .clone()
        .into_pages("p1", next_link)
        .items_with(|page| page.items)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(items, expected);
    assert_eq!(server.requests().len(), 5);
}

#[test]
fn items_surface_errors_in_place() {
    let server = ListingServer::chain(2, 2);
    server.fail_next("p2", 1);

    let mut items = server.pages("p1", next_link).items_with(|page| page.items);

    assert_eq!(items.next().unwrap().unwrap(), 1);
    assert_eq!(items.next().unwrap().unwrap(), 2);
    assert!(items.next().unwrap().is_err());
    assert_eq!(items.next().unwrap().unwrap(), 3);
    assert_eq!(items.next().unwrap().unwrap(), 4);
    assert!(items.next().is_none());
}

#[test]
fn boxed_sources_paginate() {
    let source: Box<dyn PageSource<ListingRequest, Listing, Error = String>> =
        Box::new(ListingServer::two_pages());

    let pages: Vec<_> = Pages::new(source, "p1", next_link)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(pages.len(), 2);
}
