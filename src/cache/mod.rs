//! Signing certificate cache.
//!
//! [`CertificateCache`] holds the identity provider's signing certificates,
//! indexed by position in the endpoint response, and refreshes them from a
//! [`CertificateFetcher`] when the current set has expired.
//!
//! The cache is safe to share between threads. Lookups on a fresh set only
//! take a read lock. A refresh fetches and parses without holding any lock and
//! then replaces the whole set at once, so readers observe either the old or
//! the new set and never a partially updated one. Failed refreshes leave the
//! current set untouched.
//!
//! Concurrent refreshes are not coalesced: when several threads find the set
//! expired at the same time, each of them fetches and the last one to finish
//! installs its result.

use crate::cert::parsing::{decode_certificate_list, max_age, parse_pem_certificates};
use crate::cert::Certificate;
use crate::constants::DEFAULT_CACHE_TTL;
use crate::prelude::{debug, info, warn};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use time::{OffsetDateTime, PrimitiveDateTime};

mod clock;
mod errors;
mod fetcher;
mod limits;
mod metrics;

pub use clock::{Clock, SystemClock};
pub use errors::{CacheError, FetchError, LimitKind, MetricsErrorKind};
pub use fetcher::{CertificateFetcher, CertificateResponse, HttpCertificateFetcher};
pub use limits::ResourceLimits;
pub use metrics::MetricsRecorder;

/// An immutable snapshot of the provider's signing certificates.
///
/// Certificates keep the order of the endpoint response; the position of a
/// certificate is its key index.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CertificateSet {
    certificates: Vec<Arc<Certificate>>,
    expires_at: OffsetDateTime,
}

impl CertificateSet {
    fn empty() -> Self {
        Self {
            certificates: Vec::new(),
            expires_at: PrimitiveDateTime::MIN.assume_utc(),
        }
    }

    /// Returns the certificate at key index `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Arc<Certificate>> {
        self.certificates.get(index)
    }

    /// Returns the certificates in key index order.
    pub fn certificates(&self) -> &[Arc<Certificate>] {
        &self.certificates
    }

    /// Returns the number of certificates in the set.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Returns `true` if the set holds no certificates.
    ///
    /// Only the set a cache starts with is empty; empty endpoint responses are
    /// rejected.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Returns the instant after which the set must be refreshed.
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    /// Returns `true` if the set may still be used at `now`.
    pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }
}

/// Thread-safe cache of signing certificates backed by a [`CertificateFetcher`].
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokenverifier::{CertificateCache, HttpCertificateFetcher};
///
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpCertificateFetcher::new(
///     "https://idp.example.org/idm/tenant/example.org/certificates/?scope=TENANT",
///     Duration::from_secs(10),
///     false,
/// )?;
/// let cache = CertificateCache::new(Arc::new(fetcher));
///
/// let signing_cert = cache.cert(0)?;
/// println!("{}", signing_cert.subject());
/// # Ok(())
/// # }
/// ```
pub struct CertificateCache {
    fetcher: Arc<dyn CertificateFetcher>,
    current: RwLock<Arc<CertificateSet>>,
    default_ttl: Duration,
    limits: ResourceLimits,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl fmt::Debug for CertificateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateCache")
            .field("endpoint", &self.fetcher.endpoint())
            .field("current", &self.current())
            .field("default_ttl", &self.default_ttl)
            .field("limits", &self.limits)
            .field(
                "metrics",
                &self.metrics.as_ref().map(|_| "<MetricsRecorder>"),
            )
            .finish_non_exhaustive()
    }
}

impl CertificateCache {
    /// Creates an empty cache. Nothing is fetched until the first lookup.
    ///
    /// Uses [`DEFAULT_CACHE_TTL`], [`ResourceLimits::default`] and the system clock.
    pub fn new(fetcher: Arc<dyn CertificateFetcher>) -> Self {
        Self {
            fetcher,
            current: RwLock::new(Arc::new(CertificateSet::empty())),
            default_ttl: DEFAULT_CACHE_TTL,
            limits: ResourceLimits::default(),
            clock: Arc::new(SystemClock),
            metrics: None,
        }
    }

    /// Sets the lifetime used when a response carries no `max-age` directive.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the limits applied to endpoint responses.
    #[must_use]
    pub fn with_resource_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the time source used to compute and check expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the recorder notified about refreshes, hits and errors.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns the certificate at key index `index`, refreshing first if the
    /// current set has expired.
    ///
    /// A fresh set is served without contacting the endpoint. After a failed
    /// refresh the stale set is kept but not served: every lookup retries the
    /// fetch until one succeeds.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Fetch`], [`CacheError::Parse`] or
    ///   [`CacheError::ResourceLimitExceeded`] if a required refresh fails.
    /// - [`CacheError::NotFound`] if the set has no certificate at `index`.
    pub fn cert(&self, index: usize) -> Result<Arc<Certificate>, CacheError> {
        let current = self.current();

        let set = if current.is_fresh_at(self.clock.now()) {
            debug!("Serving signing certificate {} from cache", index);
            self.record(|m| m.record_cache_hit());
            current
        } else {
            debug!(
                "Signing certificates expired at {}, refreshing",
                current.expires_at()
            );
            self.refresh()?
        };

        set.get(index).cloned().ok_or_else(|| {
            let err = CacheError::NotFound {
                index,
                available: set.len(),
            };
            self.record(|m| m.record_error(err.metrics_kind()));
            err
        })
    }

    /// Fetches and installs a new certificate set regardless of expiry.
    ///
    /// The new set expires after the response's `max-age`, or after the
    /// default lifetime when the directive is missing.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Fetch`], [`CacheError::Parse`] or
    /// [`CacheError::ResourceLimitExceeded`]. The current set is left
    /// unchanged on error.
    pub fn refresh(&self) -> Result<Arc<CertificateSet>, CacheError> {
        let (certificates, ttl) = self.fetch_certificates().map_err(|err| {
            warn!(
                "Failed to refresh signing certificates from {}: {}",
                self.fetcher.endpoint(),
                err
            );
            self.record(|m| m.record_error(err.metrics_kind()));
            err
        })?;

        let set = Arc::new(CertificateSet {
            certificates: certificates.into_iter().map(Arc::new).collect(),
            expires_at: expiry(self.clock.now(), ttl),
        });

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&set);

        info!(
            "Installed {} signing certificate(s) from {}, valid for {}s",
            set.len(),
            self.fetcher.endpoint(),
            ttl.as_secs()
        );
        self.record(|m| m.record_refresh());

        Ok(set)
    }

    /// Returns the current set without refreshing, possibly expired or empty.
    pub fn current(&self) -> Arc<CertificateSet> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn fetch_certificates(&self) -> Result<(Vec<Certificate>, Duration), CacheError> {
        let response = self.fetcher.fetch()?;

        limits::check_limit(
            LimitKind::MaxResponseBytes,
            self.limits.max_response_bytes,
            response.body.len(),
        )?;

        let pems = decode_certificate_list(&response.body)?;
        limits::check_limit(
            LimitKind::MaxCertificates,
            self.limits.max_certificates,
            pems.len(),
        )?;

        let certificates = parse_pem_certificates(&pems)?;

        let ttl = response
            .cache_control
            .as_deref()
            .and_then(max_age)
            .unwrap_or(self.default_ttl);

        Ok((certificates, ttl))
    }

    fn record(&self, f: impl FnOnce(&dyn MetricsRecorder)) {
        if let Some(metrics) = self.metrics.as_deref() {
            f(metrics);
        }
    }
}

fn expiry(now: OffsetDateTime, ttl: Duration) -> OffsetDateTime {
    time::Duration::try_from(ttl)
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}
