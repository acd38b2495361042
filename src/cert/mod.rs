//! `Certificate` type and helpers.
//!
//! A [`Certificate`] wraps DER-encoded bytes and validates them at construction time.

use crate::cert::error::CertificateError;
use crate::cert::parsing::parse_der_encoded_bytes_as_x509_certificate;
use jsonwebtoken::DecodingKey;
use x509_parser::public_key::PublicKey;

pub mod error;
pub(crate) mod parsing;

/// A single DER-encoded X.509 signing certificate.
///
/// Invariant: instances are always validated as parseable DER-encoded X.509.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Certificate(Vec<u8>);

/// Public key family a token algorithm requires.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum KeyFamily {
    Rsa,
    Ec,
}

impl KeyFamily {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ec => "EC",
        }
    }
}

impl Certificate {
    /// Parses a PEM-encoded certificate (`-----BEGIN CERTIFICATE-----`).
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError`] if the input is not a PEM certificate block or the
    /// block does not hold a parseable X.509 certificate.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CertificateError> {
        parsing::parse_pem_certificate(0, pem)
    }

    /// Returns the certificate bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the subject distinguished name, e.g. `C=US, O=example.org, CN=signer`.
    pub fn subject(&self) -> String {
        // Validated at construction, so parsing cannot fail here.
        parse_der_encoded_bytes_as_x509_certificate(self.as_bytes())
            .map(|x509| x509.subject().to_string())
            .unwrap_or_default()
    }

    /// Builds the signature verification key from the certificate's public key.
    pub(crate) fn decoding_key(&self, family: KeyFamily) -> Result<DecodingKey, CertificateError> {
        let x509 = parse_der_encoded_bytes_as_x509_certificate(self.as_bytes())?;
        let spki = x509.public_key();
        // RSA: PKCS#1 RSAPublicKey DER. EC: uncompressed curve point.
        let key_bits: &[u8] = spki.subject_public_key.data.as_ref();

        let found = match spki.parsed()? {
            PublicKey::RSA(_) => KeyFamily::Rsa,
            PublicKey::EC(_) => KeyFamily::Ec,
            _ => {
                return Err(CertificateError::KeyAlgorithmMismatch {
                    expected: family.as_str(),
                    found: "unsupported",
                })
            }
        };

        if found != family {
            return Err(CertificateError::KeyAlgorithmMismatch {
                expected: family.as_str(),
                found: found.as_str(),
            });
        }

        Ok(match family {
            KeyFamily::Rsa => DecodingKey::from_rsa_der(key_bits),
            KeyFamily::Ec => DecodingKey::from_ec_der(key_bits),
        })
    }
}

impl AsRef<[u8]> for Certificate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(der_bytes)?;
        Ok(Self(Vec::from(der_bytes)))
    }
}

impl TryFrom<Vec<u8>> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: Vec<u8>) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(&der_bytes)?;
        Ok(Self(der_bytes))
    }
}
