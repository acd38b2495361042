//! Token verification errors.

use crate::cache::CacheError;
use crate::cert::error::CertificateError;
use std::fmt;
use thiserror::Error;

/// Errors returned by [`TokenVerifier::verify`](crate::TokenVerifier::verify)
/// and the unverified parsing helpers.
///
/// Use [`TokenError::kind`] to classify an error without matching on every
/// variant.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// The token does not have at least a header and a payload segment.
    #[error("invalid JWT format")]
    InvalidJwtFormat,

    /// A token segment is not valid base64url.
    #[error("invalid base64 encoding in token segment")]
    InvalidBase64,

    /// A token segment is not JSON of the expected shape.
    #[error("invalid JSON in token segment: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The header names a signature algorithm that is not accepted.
    #[error("unsupported token signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The header `kid` is not a certificate index.
    #[error("token key id '{0}' is not a certificate index")]
    UnknownKeyId(String),

    /// The selected certificate's key does not fit the token algorithm.
    #[error("signing certificate does not match token algorithm: {0}")]
    KeyMismatch(#[source] CertificateError),

    /// The token was rejected during signature or claim validation.
    #[error("token validation failed: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),

    /// The token's `exp` claim lies in the past.
    #[error("token expired at {expired_at}")]
    Expired {
        /// The `exp` claim, in seconds since the Unix epoch.
        expired_at: i64,
    },

    /// The token's `nbf` claim lies in the future.
    #[error("token not valid before {not_before}")]
    NotYetValid {
        /// The `nbf` claim, in seconds since the Unix epoch.
        not_before: i64,
    },

    /// The token's `iat` claim lies in the future.
    #[error("token issued in the future at {issued_at}")]
    IssuedInFuture {
        /// The `iat` claim, in seconds since the Unix epoch.
        issued_at: i64,
    },

    /// An audience is expected and the token's `aud` claim names none of it.
    #[error("token audience does not match")]
    AudienceMismatch,

    /// No signing certificate could be obtained for the token.
    #[error(transparent)]
    Certificate(#[from] CacheError),
}

/// Coarse classification of a [`TokenError`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The token is not a structurally valid JWT.
    TokenMalformed,
    /// The token's expiry time is in the past.
    TokenExpired,
    /// The signature or a validated claim is wrong.
    TokenInvalid,
    /// No certificate exists for the token's key.
    CertificateUnavailable,
    /// The certificate endpoint could not be reached.
    CertificateFetchFailed,
    /// The certificate endpoint returned unusable content.
    CertificateParseFailed,
}

impl ErrorKind {
    /// Returns a stable, low-cardinality name for the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokenMalformed => "token_malformed",
            Self::TokenExpired => "token_expired",
            Self::TokenInvalid => "token_invalid",
            Self::CertificateUnavailable => "certificate_unavailable",
            Self::CertificateFetchFailed => "certificate_fetch_failed",
            Self::CertificateParseFailed => "certificate_parse_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TokenError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidJwtFormat | Self::InvalidBase64 | Self::InvalidJson(_) => {
                ErrorKind::TokenMalformed
            }
            Self::UnsupportedAlgorithm(_)
            | Self::KeyMismatch(_)
            | Self::NotYetValid { .. }
            | Self::IssuedInFuture { .. }
            | Self::AudienceMismatch => ErrorKind::TokenInvalid,
            Self::UnknownKeyId(_) => ErrorKind::CertificateUnavailable,
            Self::Expired { .. } => ErrorKind::TokenExpired,
            Self::Rejected(err) => rejected_kind(err.kind()),
            Self::Certificate(err) => match err {
                CacheError::Fetch(_) => ErrorKind::CertificateFetchFailed,
                CacheError::Parse(_) => ErrorKind::CertificateParseFailed,
                _ => ErrorKind::CertificateUnavailable,
            },
        }
    }

    /// Returns `true` if no signing certificate could be obtained, as opposed
    /// to the token itself being at fault.
    pub fn is_certificate_unavailable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CertificateUnavailable
                | ErrorKind::CertificateFetchFailed
                | ErrorKind::CertificateParseFailed
        )
    }
}

fn rejected_kind(kind: &jsonwebtoken::errors::ErrorKind) -> ErrorKind {
    use jsonwebtoken::errors::ErrorKind as Jwt;

    match kind {
        Jwt::InvalidToken | Jwt::Base64(_) | Jwt::Json(_) | Jwt::Utf8(_) => {
            ErrorKind::TokenMalformed
        }
        Jwt::ExpiredSignature => ErrorKind::TokenExpired,
        _ => ErrorKind::TokenInvalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchError;

    #[test]
    fn certificate_errors_are_classified() {
        let fetch = TokenError::from(CacheError::Fetch(FetchError::Status { status: 500 }));
        assert_eq!(fetch.kind(), ErrorKind::CertificateFetchFailed);
        assert!(fetch.is_certificate_unavailable());

        let parse = TokenError::from(CacheError::Parse(CertificateError::EmptyResponse));
        assert_eq!(parse.kind(), ErrorKind::CertificateParseFailed);

        let missing = TokenError::from(CacheError::NotFound {
            index: 3,
            available: 1,
        });
        assert_eq!(missing.kind(), ErrorKind::CertificateUnavailable);
        assert_eq!(missing.to_string(), "no signing certificate at index 3 (available: 1)");
    }

    #[test]
    fn rejected_errors_are_classified() {
        use jsonwebtoken::errors::ErrorKind as Jwt;

        let invalid = TokenError::Rejected(Jwt::InvalidSignature.into());
        assert_eq!(invalid.kind(), ErrorKind::TokenInvalid);
        assert!(!invalid.is_certificate_unavailable());

        let malformed = TokenError::Rejected(Jwt::InvalidToken.into());
        assert_eq!(malformed.kind(), ErrorKind::TokenMalformed);

        let audience = TokenError::Rejected(Jwt::InvalidAudience.into());
        assert_eq!(audience.kind(), ErrorKind::TokenInvalid);
    }

    #[test]
    fn claim_errors_are_invalid() {
        for err in [
            TokenError::NotYetValid { not_before: 10 },
            TokenError::IssuedInFuture { issued_at: 10 },
            TokenError::AudienceMismatch,
        ] {
            assert_eq!(err.kind(), ErrorKind::TokenInvalid);
            assert!(!err.is_certificate_unavailable());
        }
    }

    #[test]
    fn kind_names() {
        assert_eq!(ErrorKind::TokenExpired.to_string(), "token_expired");
        assert_eq!(
            TokenError::Expired { expired_at: 1 }.kind().as_str(),
            "token_expired"
        );
    }
}
