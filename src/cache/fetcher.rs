use super::errors::FetchError;
use crate::prelude::debug;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use std::io::Read;
use std::time::Duration;

/// Raw answer of the certificate endpoint.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CertificateResponse {
    /// Response body, expected to be the provider's JSON certificate listing.
    pub body: Vec<u8>,
    /// Value of the `Cache-Control` response header, if any.
    pub cache_control: Option<String>,
}

/// Retrieves the signing certificate listing from the identity provider.
///
/// [`HttpCertificateFetcher`] is the production implementation. Other
/// implementations can be plugged in through
/// [`TokenVerifierBuilder::fetcher`](crate::TokenVerifierBuilder::fetcher).
pub trait CertificateFetcher: Send + Sync {
    /// Performs one request and returns the body and caching header.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failures and non-success statuses.
    fn fetch(&self) -> Result<CertificateResponse, FetchError>;

    /// Location of the certificate listing, used in log output.
    fn endpoint(&self) -> &str {
        "<custom>"
    }
}

/// Blocking HTTPS client for the certificate endpoint.
///
/// Each [`fetch`](CertificateFetcher::fetch) issues a `GET` with JSON
/// `Content-Type` and `Accept` headers and a bounded timeout.
///
/// The client is blocking. It must not be used from an async runtime thread;
/// wrap calls in `tokio::task::spawn_blocking` or similar.
#[derive(Debug, Clone)]
pub struct HttpCertificateFetcher {
    url: String,
    client: Client,
    max_response_bytes: Option<usize>,
}

impl HttpCertificateFetcher {
    /// Creates a fetcher for `url`.
    ///
    /// With `insecure_skip_verify` the server certificate is not validated.
    /// Only use it against development identity providers with self-signed
    /// certificates.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        insecure_skip_verify: bool,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            url: url.into(),
            client,
            max_response_bytes: None,
        })
    }

    /// Stops reading a response body after `limit` bytes plus one.
    ///
    /// The truncated body is one byte over the limit, so the cache's
    /// `max_response_bytes` check still rejects it.
    #[must_use]
    pub fn with_max_response_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_response_bytes = limit;
        self
    }
}

impl CertificateFetcher for HttpCertificateFetcher {
    fn fetch(&self) -> Result<CertificateResponse, FetchError> {
        debug!("Requesting signing certificates from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let cache_control = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = match self.max_response_bytes {
            Some(limit) => {
                let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
                if response.content_length().is_some_and(|len| len > cap) {
                    debug!(
                        "Certificate response announces more than {} bytes, reading a prefix",
                        limit
                    );
                }
                let mut body = Vec::new();
                response
                    .take(cap)
                    .read_to_end(&mut body)
                    .map_err(FetchError::Body)?;
                body
            }
            None => response.bytes().map_err(FetchError::Request)?.to_vec(),
        };

        Ok(CertificateResponse {
            body,
            cache_control,
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
