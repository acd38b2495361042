use super::{KeySelection, TokenVerifier};
use crate::cache::{
    CertificateCache, CertificateFetcher, Clock, FetchError, HttpCertificateFetcher,
    MetricsRecorder, ResourceLimits, SystemClock,
};
use crate::constants::{DEFAULT_CACHE_TTL, DEFAULT_REQUEST_TIMEOUT};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`TokenVerifier`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tokenverifier::{KeySelection, ResourceLimits, TokenVerifier};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = TokenVerifier::builder(
///     "https://idp.example.org/idm/tenant/example.org/certificates/?scope=TENANT",
/// )
/// .request_timeout(Duration::from_secs(5))
/// .default_cache_ttl(Duration::from_secs(600))
/// .key_selection(KeySelection::FirstCertificate)
/// .expected_audience("rs_admin_server")
/// .resource_limits(ResourceLimits::default())
/// .build()?;
/// # Ok(())
/// # }
/// ```
pub struct TokenVerifierBuilder {
    url: String,
    request_timeout: Duration,
    insecure_skip_verify: bool,
    default_cache_ttl: Duration,
    key_selection: KeySelection,
    leeway: Duration,
    audience: Option<Vec<String>>,
    limits: ResourceLimits,
    metrics: Option<Arc<dyn MetricsRecorder>>,
    clock: Option<Arc<dyn Clock>>,
    fetcher: Option<Arc<dyn CertificateFetcher>>,
}

impl Debug for TokenVerifierBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifierBuilder")
            .field("url", &self.url)
            .field("request_timeout", &self.request_timeout)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("default_cache_ttl", &self.default_cache_ttl)
            .field("key_selection", &self.key_selection)
            .field("leeway", &self.leeway)
            .field("audience", &self.audience)
            .field("limits", &self.limits)
            .field(
                "metrics",
                &self.metrics.as_ref().map(|_| "<MetricsRecorder>"),
            )
            .field("clock", &self.clock.as_ref().map(|_| "<Clock>"))
            .field(
                "fetcher",
                &self.fetcher.as_ref().map(|_| "<CertificateFetcher>"),
            )
            .finish()
    }
}

impl TokenVerifierBuilder {
    /// Creates a builder for the certificate listing at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            insecure_skip_verify: false,
            default_cache_ttl: DEFAULT_CACHE_TTL,
            key_selection: KeySelection::default(),
            leeway: Duration::ZERO,
            audience: None,
            limits: ResourceLimits::default(),
            metrics: None,
            clock: None,
            fetcher: None,
        }
    }

    /// Sets the timeout of each certificate endpoint request.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Disables TLS certificate validation toward the certificate endpoint.
    ///
    /// Only for development identity providers with self-signed certificates.
    #[must_use]
    pub fn insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Sets the certificate set lifetime used when the endpoint sends no `max-age`.
    #[must_use]
    pub fn default_cache_ttl(mut self, ttl: Duration) -> Self {
        self.default_cache_ttl = ttl;
        self
    }

    /// Sets how the signing certificate is chosen for a token.
    #[must_use]
    pub fn key_selection(mut self, selection: KeySelection) -> Self {
        self.key_selection = selection;
        self
    }

    /// Sets the clock skew tolerated when checking `exp`, `nbf` and `iat`.
    #[must_use]
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Adds an accepted audience.
    ///
    /// Once at least one audience is set, tokens must carry an `aud` claim
    /// containing one of them. Without any, `aud` is not checked.
    #[must_use]
    pub fn expected_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience
            .get_or_insert_with(Vec::new)
            .push(audience.into());
        self
    }

    /// Sets the limits applied to certificate endpoint responses.
    #[must_use]
    pub fn resource_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the metrics recorder.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets the time source for cache and token expiry. Defaults to [`SystemClock`].
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the HTTP client with a custom certificate fetcher.
    ///
    /// The URL, request timeout and TLS settings are then unused.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn CertificateFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Builds the [`TokenVerifier`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<TokenVerifier, FetchError> {
        let fetcher: Arc<dyn CertificateFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(
                HttpCertificateFetcher::new(
                    self.url,
                    self.request_timeout,
                    self.insecure_skip_verify,
                )?
                .with_max_response_bytes(self.limits.max_response_bytes),
            ),
        };

        let mut cache = CertificateCache::new(fetcher)
            .with_default_ttl(self.default_cache_ttl)
            .with_resource_limits(self.limits)
            .with_clock(
                self.clock
                    .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>),
            );
        if let Some(metrics) = self.metrics {
            cache = cache.with_metrics(metrics);
        }

        Ok(TokenVerifier {
            cache,
            key_selection: self.key_selection,
            leeway: self.leeway,
            audience: self.audience,
        })
    }
}
