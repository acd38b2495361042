mod common;

use common::{provider_body, SIGNING_CERT_1, SIGNING_KEY_1};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::net::TcpListener;
use std::time::Duration;
use tokenverifier::{
    certificate_url, CacheError, CertificateFetcher, ErrorKind, FetchError,
    HttpCertificateFetcher, LimitKind, ResourceLimits, TokenError, TokenVerifier,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "vsphere.local";
const CERTIFICATES_PATH: &str = "/idm/tenant/vsphere.local/certificates/";

async fn mount_certificates(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(CERTIFICATES_PATH))
        .and(query_param("scope", "TENANT"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_sends_json_headers_and_reads_cache_control() {
    let server = MockServer::start().await;
    let body = provider_body(&[SIGNING_CERT_1]);

    Mock::given(method("GET"))
        .and(path(CERTIFICATES_PATH))
        .and(query_param("scope", "TENANT"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.clone(), "application/json")
                .insert_header("cache-control", "public, max-age=120"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = certificate_url(&server.uri(), TENANT).unwrap();
    let response = tokio::task::spawn_blocking(move || {
        let fetcher = HttpCertificateFetcher::new(url, Duration::from_secs(5), false)?;
        fetcher.fetch()
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response.body, body);
    assert_eq!(
        response.cache_control.as_deref(),
        Some("public, max-age=120")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    mount_certificates(&server, ResponseTemplate::new(500)).await;

    let url = certificate_url(&server.uri(), TENANT).unwrap();
    let err = tokio::task::spawn_blocking(move || {
        let fetcher = HttpCertificateFetcher::new(url, Duration::from_secs(5), false)?;
        fetcher.fetch()
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500 }));
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_times_out() {
    let server = MockServer::start().await;
    mount_certificates(
        &server,
        ResponseTemplate::new(200)
            .set_body_raw(provider_body(&[SIGNING_CERT_1]), "application/json")
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let url = certificate_url(&server.uri(), TENANT).unwrap();
    let err = tokio::task::spawn_blocking(move || {
        let fetcher = HttpCertificateFetcher::new(url, Duration::from_millis(200), false)?;
        fetcher.fetch()
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, FetchError::Request(ref e) if e.is_timeout()));
}

#[tokio::test(flavor = "multi_thread")]
async fn verifier_fetches_certificates_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CERTIFICATES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(provider_body(&[SIGNING_CERT_1]), "application/json")
                .insert_header("cache-control", "max-age=300"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let token = encode(
        &Header::new(Algorithm::RS256),
        &serde_json::json!({ "sub": "Administrator@vsphere.local", "exp": now + 600 }),
        &EncodingKey::from_rsa_pem(SIGNING_KEY_1.as_bytes()).unwrap(),
    )
    .unwrap();

    let url = certificate_url(&server.uri(), TENANT).unwrap();
    let subjects = tokio::task::spawn_blocking(move || {
        let verifier = TokenVerifier::new(url).unwrap();
        (0..3)
            .map(|_| verifier.verify(&token).map(|c| c.subject().map(str::to_owned)))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(subjects.len(), 3);
    assert!(subjects
        .iter()
        .all(|s| s.as_deref() == Some("Administrator@vsphere.local")));
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_stops_reading_past_the_size_limit() {
    let server = MockServer::start().await;
    mount_certificates(
        &server,
        ResponseTemplate::new(200).set_body_raw(vec![b' '; 64 * 1024], "application/json"),
    )
    .await;

    let url = certificate_url(&server.uri(), TENANT).unwrap();
    let response = tokio::task::spawn_blocking(move || {
        HttpCertificateFetcher::new(url, Duration::from_secs(5), false)?
            .with_max_response_bytes(Some(100))
            .fetch()
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response.body.len(), 101);
}

#[tokio::test(flavor = "multi_thread")]
async fn verifier_rejects_oversized_certificate_response() {
    let server = MockServer::start().await;
    mount_certificates(
        &server,
        ResponseTemplate::new(200)
            .set_body_raw(provider_body(&[SIGNING_CERT_1]), "application/json"),
    )
    .await;

    let token = encode(
        &Header::new(Algorithm::RS256),
        &serde_json::json!({ "sub": "a" }),
        &EncodingKey::from_rsa_pem(SIGNING_KEY_1.as_bytes()).unwrap(),
    )
    .unwrap();

    let url = certificate_url(&server.uri(), TENANT).unwrap();
    let err = tokio::task::spawn_blocking(move || {
        let limits = ResourceLimits {
            max_response_bytes: Some(256),
            ..ResourceLimits::default()
        };
        let verifier = TokenVerifier::builder(url)
            .resource_limits(limits)
            .build()
            .unwrap();
        verifier.verify(&token)
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(
        err,
        TokenError::Certificate(CacheError::ResourceLimitExceeded {
            kind: LimitKind::MaxResponseBytes,
            limit: 256,
            actual: 257,
        })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn verifier_reports_unreachable_endpoint() {
    // bind and release a port so that nothing listens on it
    let addr = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let url = certificate_url(&format!("http://{addr}"), TENANT).unwrap();

    let token = encode(
        &Header::new(Algorithm::RS256),
        &serde_json::json!({ "sub": "a" }),
        &EncodingKey::from_rsa_pem(SIGNING_KEY_1.as_bytes()).unwrap(),
    )
    .unwrap();

    let err = tokio::task::spawn_blocking(move || {
        let verifier = TokenVerifier::builder(url)
            .request_timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        verifier.verify(&token)
    })
    .await
    .unwrap()
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CertificateFetchFailed);
    assert!(matches!(
        err,
        TokenError::Certificate(CacheError::Fetch(FetchError::Request(_)))
    ));
}
