//! Bearer token verification against the identity provider's signing certificates.
//!
//! A [`TokenVerifier`] owns one [`CertificateCache`] for one certificate
//! endpoint. [`TokenVerifier::verify`] checks token structure, resolves the
//! signing certificate, verifies the signature and then the time and audience
//! claims, and returns the decoded [`Claims`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tokenverifier::{certificate_url, ErrorKind, TokenVerifier};
//!
//! # fn run(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let url = certificate_url("idp.example.org", "example.org")?;
//! let verifier = TokenVerifier::builder(url)
//!     .request_timeout(Duration::from_secs(5))
//!     .leeway(Duration::from_secs(30))
//!     .build()?;
//!
//! match verifier.verify(token) {
//!     Ok(claims) => println!("authenticated {:?}", claims.subject()),
//!     Err(e) if e.kind() == ErrorKind::TokenExpired => println!("token needs a refresh"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

use crate::cache::{CertificateCache, FetchError};
use crate::constants::DEFAULT_KEY_INDEX;
use crate::error::TokenError;
use crate::prelude::debug;
use crate::token::{decode_unverified, Claims, Header};
use jsonwebtoken::Validation;
use std::time::Duration;

mod builder;

pub use builder::TokenVerifierBuilder;

/// How the signing certificate for a token is chosen from the cached set.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum KeySelection {
    /// A numeric `kid` header is the certificate index; tokens without `kid`
    /// use the first certificate. A non-numeric `kid` is rejected.
    #[default]
    HeaderKeyId,
    /// Always use the first certificate and ignore `kid`.
    ///
    /// Suits providers that sign with a single key.
    FirstCertificate,
}

impl KeySelection {
    fn key_index(self, header: &Header) -> Result<usize, TokenError> {
        match (self, header.kid.as_deref()) {
            (Self::FirstCertificate, _) | (Self::HeaderKeyId, None) => Ok(DEFAULT_KEY_INDEX),
            (Self::HeaderKeyId, Some(kid)) => kid
                .parse::<usize>()
                .map_err(|_| TokenError::UnknownKeyId(kid.to_owned())),
        }
    }
}

/// Verifies bearer tokens issued by one identity provider.
///
/// The verifier is `Send + Sync`; share it (e.g. in an `Arc`) to reuse the
/// certificate cache across threads.
///
/// Certificates are fetched with a blocking HTTP client. From async code, run
/// [`verify`](Self::verify) inside `tokio::task::spawn_blocking` or an
/// equivalent.
#[derive(Debug)]
pub struct TokenVerifier {
    cache: CertificateCache,
    key_selection: KeySelection,
    leeway: Duration,
    audience: Option<Vec<String>>,
}

impl TokenVerifier {
    /// Creates a verifier for the certificate listing at `url` with default settings.
    ///
    /// No request is made until the first verification.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        Self::builder(url).build()
    }

    /// Returns a builder for a verifier of the certificate listing at `url`.
    pub fn builder(url: impl Into<String>) -> TokenVerifierBuilder {
        TokenVerifierBuilder::new(url)
    }

    /// Returns the certificate cache backing this verifier.
    pub fn cache(&self) -> &CertificateCache {
        &self.cache
    }

    /// Verifies `token` and returns its claims.
    ///
    /// Checks run in this order, and the first failure is returned:
    /// 1. the token has three base64url segments with JSON header and payload
    ///    and an accepted algorithm (no network access happens before this);
    /// 2. the signing certificate is available, refreshing the cache if needed;
    /// 3. the signature is valid for the certificate's key;
    /// 4. the `exp` claim, if present, has not passed;
    /// 5. the `nbf` and `iat` claims, if present, are not in the future;
    /// 6. when an audience is configured, the `aud` claim names one of them.
    ///
    /// Time claims are compared against the cache clock with the configured
    /// leeway.
    ///
    /// A refresh performs a blocking HTTP request. Async callers must call
    /// this from a blocking context such as `tokio::task::spawn_blocking`;
    /// the blocking client panics when used on an async runtime thread.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`]; use [`TokenError::kind`] to tell a malformed,
    /// expired or invalid token apart from an unavailable certificate.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_inner(token).map_err(|err| {
            debug!("Token verification failed: {}", err.kind());
            err
        })
    }

    fn verify_inner(&self, token: &str) -> Result<Claims, TokenError> {
        let (header, claims) = decode_unverified(token)?;

        let index = self.key_selection.key_index(&header)?;
        let cert = self.cache.cert(index)?;
        let key = cert
            .decoding_key(header.alg.key_family())
            .map_err(TokenError::KeyMismatch)?;

        jsonwebtoken::decode::<serde::de::IgnoredAny>(token, &key, &signature_only(&header))
            .map_err(TokenError::Rejected)?;

        let now = self.cache.clock().now().unix_timestamp();
        self.check_time_claims(&claims, now)?;
        self.check_audience(&claims)?;

        Ok(claims)
    }

    fn check_time_claims(&self, claims: &Claims, now: i64) -> Result<(), TokenError> {
        let leeway = i64::try_from(self.leeway.as_secs()).unwrap_or(i64::MAX);

        if let Some(exp) = claims.expires_at() {
            if now > exp.saturating_add(leeway) {
                return Err(TokenError::Expired { expired_at: exp });
            }
        }

        let latest = now.saturating_add(leeway);
        if let Some(nbf) = claims.not_before() {
            if nbf > latest {
                return Err(TokenError::NotYetValid { not_before: nbf });
            }
        }
        if let Some(iat) = claims.issued_at() {
            if iat > latest {
                return Err(TokenError::IssuedInFuture { issued_at: iat });
            }
        }
        Ok(())
    }

    fn check_audience(&self, claims: &Claims) -> Result<(), TokenError> {
        let Some(expected) = &self.audience else {
            return Ok(());
        };

        if claims.audience().iter().any(|aud| expected.contains(aud)) {
            Ok(())
        } else {
            Err(TokenError::AudienceMismatch)
        }
    }
}

// Claims are checked by the verifier against its own clock, so jsonwebtoken
// only verifies the signature.
fn signature_only(header: &Header) -> Validation {
    let mut validation = Validation::new(header.alg.to_jsonwebtoken());
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}
