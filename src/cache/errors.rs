use crate::cert::error::CertificateError;
use std::fmt;
use thiserror::Error;

/// Errors returned by [`CertificateCache`](super::CertificateCache).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    /// The certificate endpoint could not be reached or answered with an error status.
    #[error("failed to fetch signing certificates: {0}")]
    Fetch(#[from] FetchError),

    /// The endpoint response could not be parsed into certificates.
    #[error("failed to parse signing certificates: {0}")]
    Parse(#[from] CertificateError),

    /// The current certificate set has no entry at the requested index.
    #[error("no signing certificate at index {index} (available: {available})")]
    NotFound {
        /// The requested index.
        index: usize,
        /// Number of certificates in the current set.
        available: usize,
    },

    /// Resource limit exceeded.
    ///
    /// The endpoint response exceeds one of the configured
    /// [`ResourceLimits`](super::ResourceLimits); nothing was installed.
    #[error("resource limit exceeded: {kind} (limit={limit}, actual={actual})")]
    ResourceLimitExceeded {
        /// The kind of limit that was exceeded.
        kind: LimitKind,
        /// The configured limit value.
        limit: usize,
        /// The actual value that exceeded the limit.
        actual: usize,
    },
}

/// Errors raised by a [`CertificateFetcher`](super::CertificateFetcher).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("cannot build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed at the transport layer (connection, TLS, timeout).
    #[error("request to certificate endpoint failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response body could not be read.
    #[error("failed to read certificate endpoint response: {0}")]
    Body(#[source] std::io::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("certificate endpoint returned HTTP status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Failure reported by a custom fetcher.
    #[error("certificate fetch failed: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// The kind of resource limit that was exceeded.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LimitKind {
    /// Maximum number of certificates in one response exceeded.
    MaxCertificates,
    /// Maximum response body size exceeded.
    MaxResponseBytes,
}

impl LimitKind {
    /// Returns a stable string representation of the limit kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaxCertificates => "max_certificates",
            Self::MaxResponseBytes => "max_response_bytes",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error kinds for structured metrics reporting.
///
/// Use these stable, low-cardinality labels when recording metrics.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MetricsErrorKind {
    /// The certificate endpoint request failed.
    FetchFailed,
    /// The endpoint response could not be parsed.
    ParseFailed,
    /// The endpoint response exceeded a resource limit.
    LimitExceeded,
    /// A certificate index was requested that the current set does not hold.
    CertificateNotFound,
}

impl MetricsErrorKind {
    /// Returns a string representation of the error kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
            Self::LimitExceeded => "limit_exceeded",
            Self::CertificateNotFound => "certificate_not_found",
        }
    }
}

impl fmt::Display for MetricsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CacheError {
    pub(super) const fn metrics_kind(&self) -> MetricsErrorKind {
        match self {
            Self::Fetch(_) => MetricsErrorKind::FetchFailed,
            Self::Parse(_) => MetricsErrorKind::ParseFailed,
            Self::NotFound { .. } => MetricsErrorKind::CertificateNotFound,
            Self::ResourceLimitExceeded { .. } => MetricsErrorKind::LimitExceeded,
        }
    }
}
