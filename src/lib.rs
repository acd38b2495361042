#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

//! Verification of JWT bearer tokens issued by an identity provider that
//! publishes its token signing certificates over HTTPS.
//!
//! [`TokenVerifier`] validates structure, signature and expiry of a token and
//! returns its [`Claims`]. Signing certificates are kept in a
//! [`CertificateCache`] that refreshes lazily from the provider's certificate
//! endpoint, honoring the `Cache-Control: max-age` of each response.
//!
//! # Examples
//!
//! ```no_run
//! use tokenverifier::{certificate_url, parse_token_details, ErrorKind, TokenVerifier};
//!
//! # fn some_function(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! // certificate listing of the tenant's identity provider
//! let url = certificate_url("idp.example.org", "example.org")?;
//! let verifier = TokenVerifier::new(url)?;
//!
//! // authenticate a bearer token
//! match verifier.verify(token) {
//!     Ok(claims) => {
//!         println!("subject: {:?}", claims.subject());
//!         println!("groups: {:?}", claims.groups());
//!     }
//!     Err(err) if err.is_certificate_unavailable() => {
//!         // the provider could not be reached; the token may still be valid
//!         return Err(err.into());
//!     }
//!     Err(err) => println!("rejected token: {}", err.kind()),
//! }
//!
//! // inspect a token without verifying it
//! let unverified = parse_token_details(token)?;
//! println!("expires at: {:?}", unverified.expiry());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `logging` (default): emit diagnostics through the `log` crate.
//! - `tracing`: emit diagnostics through `tracing` instead.

mod observability;
mod prelude;

pub mod cache;
pub mod cert;
pub mod constants;
pub mod endpoint;
pub mod error;
pub mod token;
pub mod verifier;

pub use cache::{
    CacheError, CertificateCache, CertificateFetcher, CertificateResponse, CertificateSet, Clock,
    FetchError, HttpCertificateFetcher, LimitKind, MetricsErrorKind, MetricsRecorder,
    ResourceLimits, SystemClock,
};
pub use cert::error::CertificateError;
pub use cert::Certificate;
pub use endpoint::{certificate_url, EndpointError};
pub use error::{ErrorKind, TokenError};
pub use token::{
    parse_refresh_token_details, parse_token_details, Claims, JwtAlg, RefreshTokenClaims,
    TokenClass,
};
pub use verifier::{KeySelection, TokenVerifier, TokenVerifierBuilder};
