mod common;

use common::{FakeFetcher, ManualClock, Reply, PROVIDER_RESPONSE};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokenverifier::{CacheError, CertificateCache, CertificateError, FetchError};

const START: i64 = 1_700_000_000;

fn setup(reply: Reply) -> (Arc<FakeFetcher>, Arc<ManualClock>, CertificateCache) {
    let fetcher = Arc::new(FakeFetcher::new(reply));
    let clock = Arc::new(ManualClock::at(START));
    let cache = CertificateCache::new(fetcher.clone()).with_clock(clock.clone());
    (fetcher, clock, cache)
}

#[test]
fn fetches_once_within_validity_window() {
    let (fetcher, clock, cache) = setup(Reply::ok(PROVIDER_RESPONSE, None));

    for _ in 0..10 {
        cache.cert(0).unwrap();
        cache.cert(1).unwrap();
        clock.advance(Duration::from_secs(60));
    }

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(cache.current().len(), 2);
}

#[test]
fn refetches_once_after_max_age() {
    let (fetcher, clock, cache) = setup(Reply::ok(PROVIDER_RESPONSE, Some("max-age=60")));

    cache.cert(0).unwrap();
    assert_eq!(fetcher.calls(), 1);

    clock.advance(Duration::from_secs(61));
    cache.cert(0).unwrap();
    assert_eq!(fetcher.calls(), 2);

    clock.advance(Duration::from_secs(30));
    cache.cert(0).unwrap();
    cache.cert(1).unwrap();
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn expired_set_is_refreshed_at_exact_expiry() {
    let (fetcher, clock, cache) = setup(Reply::ok(PROVIDER_RESPONSE, Some("max-age=60")));

    cache.cert(0).unwrap();
    clock.advance(Duration::from_secs(60));
    cache.cert(0).unwrap();

    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn fetch_failure_after_expiry_fails_every_call() {
    let (fetcher, clock, cache) = setup(Reply::ok(PROVIDER_RESPONSE, Some("max-age=60")));
    let installed = cache.refresh().unwrap();

    fetcher.set_reply(Reply::Status(500));
    clock.advance(Duration::from_secs(61));

    for attempt in 1..=3 {
        let err = cache.cert(0).unwrap_err();
        assert!(matches!(
            err,
            CacheError::Fetch(FetchError::Status { status: 500 })
        ));
        assert_eq!(fetcher.calls(), 1 + attempt);
    }

    // the stale set stays installed but is not served
    assert!(Arc::ptr_eq(&installed, &cache.current()));

    fetcher.set_reply(Reply::ok(PROVIDER_RESPONSE, Some("max-age=60")));
    cache.cert(0).unwrap();
    cache.cert(0).unwrap();
    assert_eq!(fetcher.calls(), 5);
}

#[test]
fn parse_failure_keeps_previous_set() {
    let (fetcher, clock, cache) = setup(Reply::ok(PROVIDER_RESPONSE, Some("max-age=60")));
    let installed = cache.refresh().unwrap();

    fetcher.set_reply(Reply::ok(&b"<html>maintenance</html>"[..], None));
    clock.advance(Duration::from_secs(61));

    let err = cache.cert(0).unwrap_err();
    assert!(matches!(
        err,
        CacheError::Parse(CertificateError::InvalidResponse(_))
    ));
    assert!(Arc::ptr_eq(&installed, &cache.current()));
}

#[test]
fn one_bad_certificate_fails_the_whole_refresh() {
    let body = serde_json::to_vec(&serde_json::json!([{
        "certificates": [
            { "encoded": common::SIGNING_CERT_1 },
            { "encoded": "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n" },
        ]
    }]))
    .unwrap();
    let (_fetcher, _clock, cache) = setup(Reply::ok(body, None));

    let err = cache.cert(0).unwrap_err();
    assert!(matches!(err, CacheError::Parse(_)));
    assert!(cache.current().is_empty());
}

#[test]
fn empty_listing_is_a_parse_failure() {
    let (_fetcher, _clock, cache) = setup(Reply::ok(&br#"[{"certificates":[]}]"#[..], None));

    let err = cache.cert(0).unwrap_err();
    assert!(matches!(
        err,
        CacheError::Parse(CertificateError::EmptyResponse)
    ));
}

#[test]
fn index_out_of_range() {
    let (fetcher, _clock, cache) = setup(Reply::ok(PROVIDER_RESPONSE, None));

    let err = cache.cert(5).unwrap_err();
    assert!(matches!(
        err,
        CacheError::NotFound {
            index: 5,
            available: 2
        }
    ));

    // a miss on a fresh set does not trigger another fetch
    cache.cert(5).unwrap_err();
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn refresh_ignores_freshness() {
    let (fetcher, clock, cache) = setup(Reply::ok(PROVIDER_RESPONSE, Some("max-age=600")));

    cache.refresh().unwrap();
    let set = cache.refresh().unwrap();

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(set.expires_at().unix_timestamp(), clock.unix_timestamp() + 600);
    assert!(set.is_fresh_at(cache.current().expires_at() - time::Duration::SECOND));
}

#[test]
fn certificates_keep_response_order() {
    let body = common::provider_body(&[common::SIGNING_CERT_2, common::SIGNING_CERT_1]);
    let (_fetcher, _clock, cache) = setup(Reply::ok(body, None));

    assert!(cache.cert(0).unwrap().subject().contains("token-signing-2"));
    assert!(cache.cert(1).unwrap().subject().contains("token-signing-1"));
}

#[test]
fn concurrent_lookups() {
    let (fetcher, _clock, cache) = setup(Reply::ok(PROVIDER_RESPONSE, None));
    let cache = Arc::new(cache);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..100 {
                    let cert = cache.cert(i % 2).unwrap();
                    assert!(!cert.as_bytes().is_empty());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // no single-flight: each thread refreshes at most once on the empty cache
    assert!((1..=8).contains(&fetcher.calls()));
    assert_eq!(cache.current().len(), 2);
}
