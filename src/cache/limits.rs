use super::errors::{CacheError, LimitKind};

/// Resource limits applied to every certificate endpoint response.
///
/// Limits are enforced before a new certificate set is installed. A response
/// that exceeds a limit fails the refresh and leaves the current set in place.
///
/// Use `None` for unlimited (no limit enforced), or `Some(usize)` for a specific limit.
///
/// # Examples
///
/// ```rust
/// use tokenverifier::ResourceLimits;
///
/// let limits = ResourceLimits {
///     max_certificates: Some(8),
///     max_response_bytes: None,
/// };
/// assert_ne!(limits, ResourceLimits::default());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum number of certificates accepted in one response.
    pub max_certificates: Option<usize>,
    /// Maximum response body size in bytes.
    pub max_response_bytes: Option<usize>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            // Providers publish a handful of signing certificates.
            max_certificates: Some(64),
            max_response_bytes: Some(1024 * 1024), // 1MB
        }
    }
}

impl ResourceLimits {
    /// Creates a `ResourceLimits` with all limits set to unlimited (no limits enforced).
    pub const fn unlimited() -> Self {
        Self {
            max_certificates: None,
            max_response_bytes: None,
        }
    }
}

pub(super) fn check_limit(
    kind: LimitKind,
    limit: Option<usize>,
    actual: usize,
) -> Result<(), CacheError> {
    match limit {
        Some(limit) if actual > limit => Err(CacheError::ResourceLimitExceeded {
            kind,
            limit,
            actual,
        }),
        _ => Ok(()),
    }
}
