//! Internal parsing helpers for the certificate endpoint response.

use crate::cert::error::CertificateError;
use crate::cert::Certificate;
use serde::Deserialize;
use std::time::Duration;
use x509_parser::certificate::X509Certificate;
use x509_parser::error::X509Error;
use x509_parser::nom::Err;

const PEM_CERTIFICATE_LABEL: &str = "CERTIFICATE";
const MAX_AGE_DIRECTIVE: &str = "max-age=";

// The endpoint wraps the certificate list in a single-element array:
// `[ { "certificates": [ { "encoded": "<PEM>" }, ... ] } ]`
#[derive(Debug, Deserialize)]
struct CertificateChain {
    #[serde(default)]
    certificates: Vec<EncodedCertificate>,
}

#[derive(Debug, Deserialize)]
struct EncodedCertificate {
    encoded: String,
}

/// Decodes the JSON body returned by the certificate endpoint into the list of
/// PEM strings it carries, in the order the provider returned them.
///
/// Only the first element of the outer array is read.
pub(crate) fn decode_certificate_list(body: &[u8]) -> Result<Vec<String>, CertificateError> {
    let chains: Vec<CertificateChain> = serde_json::from_slice(body)?;

    let pems: Vec<String> = chains
        .into_iter()
        .next()
        .ok_or(CertificateError::EmptyResponse)?
        .certificates
        .into_iter()
        .map(|c| c.encoded)
        .collect();

    if pems.is_empty() {
        return Err(CertificateError::EmptyResponse);
    }

    Ok(pems)
}

/// Parses every PEM string as an X.509 certificate.
///
/// Fails on the first entry that does not parse; no partial list is returned.
pub(crate) fn parse_pem_certificates(
    pems: &[String],
) -> Result<Vec<Certificate>, CertificateError> {
    pems.iter()
        .enumerate()
        .map(|(index, pem)| parse_pem_certificate(index, pem.as_bytes()))
        .collect()
}

/// Parses a single PEM block holding a certificate.
pub(crate) fn parse_pem_certificate(
    index: usize,
    pem_bytes: &[u8],
) -> Result<Certificate, CertificateError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(pem_bytes).map_err(|e| {
        let reason = match e {
            Err::Incomplete(_) => "incomplete PEM block".to_owned(),
            Err::Error(err) | Err::Failure(err) => format!("{err:?}"),
        };
        CertificateError::InvalidPem { index, reason }
    })?;

    if pem.label != PEM_CERTIFICATE_LABEL {
        return Err(CertificateError::UnexpectedPemLabel {
            index,
            label: pem.label,
        });
    }

    Certificate::try_from(pem.contents)
}

/// Parses the given DER-encoded bytes as an X.509 certificate.
///
/// Returns a [`CertificateError`] if the input is not a parseable DER-encoded X.509 certificate.
pub(crate) fn parse_der_encoded_bytes_as_x509_certificate(
    der_bytes: &[u8],
) -> Result<X509Certificate<'_>, CertificateError> {
    match x509_parser::parse_x509_certificate(der_bytes) {
        Ok((_, cert)) => Ok(cert),
        Err(Err::Incomplete(_)) => Err(CertificateError::ParseX509Certificate(
            X509Error::InvalidCertificate,
        )),
        Err(Err::Error(e) | Err::Failure(e)) => Err(CertificateError::ParseX509Certificate(e)),
    }
}

/// Extracts the `max-age` directive from a `Cache-Control` header value.
///
/// Returns `None` when the directive is absent or its value is not a
/// non-negative integer number of seconds.
pub(crate) fn max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|directive| {
            let prefix = directive.get(..MAX_AGE_DIRECTIVE.len())?;
            if !prefix.eq_ignore_ascii_case(MAX_AGE_DIRECTIVE) {
                return None;
            }
            directive[MAX_AGE_DIRECTIVE.len()..]
                .trim_matches('"')
                .parse::<u64>()
                .ok()
        })
        .map(Duration::from_secs)
}
