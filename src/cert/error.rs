//! Error types for certificate parsing and public key extraction.

use x509_parser::error::X509Error;

/// An error that may arise parsing the provider's certificate list or the
/// X.509 certificates it contains.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CertificateError {
    /// The response body is not a JSON certificate list.
    #[error("cannot deserialize certificate list")]
    InvalidResponse(#[from] serde_json::Error),

    /// The response body contains no certificates.
    #[error("certificate list is empty")]
    EmptyResponse,

    /// A certificate entry is not a readable PEM block.
    #[error("certificate {index} is not valid PEM: {reason}")]
    InvalidPem {
        /// Position of the entry in the provider's list.
        index: usize,
        /// Description returned by the PEM reader.
        reason: String,
    },

    /// A PEM block does not carry a certificate.
    #[error("certificate {index} has unexpected PEM label: {label}")]
    UnexpectedPemLabel {
        /// Position of the entry in the provider's list.
        index: usize,
        /// The label found in the PEM header.
        label: String,
    },

    /// Error returned by the X.509 parsing library.
    #[error("failed parsing X.509 certificate")]
    ParseX509Certificate(#[from] X509Error),

    /// The certificate's public key cannot verify signatures of the requested algorithm.
    #[error("certificate public key is {found}, token requires {expected}")]
    KeyAlgorithmMismatch {
        /// Key family required by the token algorithm.
        expected: &'static str,
        /// Key family found in the certificate.
        found: &'static str,
    },
}
