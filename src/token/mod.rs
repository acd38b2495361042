//! Bearer token decoding.
//!
//! [`parse_token_details`] and [`parse_refresh_token_details`] decode the payload
//! segment **without** any signature or expiry check. They are meant for
//! inspection and diagnostics. To authenticate a token use
//! [`TokenVerifier::verify`](crate::TokenVerifier::verify).

use crate::cert::KeyFamily;
use crate::error::TokenError;
use serde::de::DeserializeOwned;
use serde::Deserialize;

mod claims;

pub use claims::{Claims, RefreshTokenClaims, TokenClass};

/// Signature algorithms accepted for bearer tokens.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum JwtAlg {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// ECDSA using P-384 and SHA-384
    ES384,
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256
    PS256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384
    PS384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512
    PS512,
}

impl JwtAlg {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "RS256" => Self::RS256,
            "RS384" => Self::RS384,
            "RS512" => Self::RS512,
            "ES256" => Self::ES256,
            "ES384" => Self::ES384,
            "PS256" => Self::PS256,
            "PS384" => Self::PS384,
            "PS512" => Self::PS512,
            _ => return None,
        })
    }

    pub(crate) const fn to_jsonwebtoken(self) -> jsonwebtoken::Algorithm {
        match self {
            Self::RS256 => jsonwebtoken::Algorithm::RS256,
            Self::RS384 => jsonwebtoken::Algorithm::RS384,
            Self::RS512 => jsonwebtoken::Algorithm::RS512,
            Self::ES256 => jsonwebtoken::Algorithm::ES256,
            Self::ES384 => jsonwebtoken::Algorithm::ES384,
            Self::PS256 => jsonwebtoken::Algorithm::PS256,
            Self::PS384 => jsonwebtoken::Algorithm::PS384,
            Self::PS512 => jsonwebtoken::Algorithm::PS512,
        }
    }

    pub(crate) const fn key_family(self) -> KeyFamily {
        match self {
            Self::ES256 | Self::ES384 => KeyFamily::Ec,
            _ => KeyFamily::Rsa,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
struct RawHeader {
    #[serde(default)]
    kid: Option<KeyId>,
    alg: String,
}

/// A `kid` header, which some providers issue as a JSON number.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(untagged)]
enum KeyId {
    Text(String),
    Index(u64),
    Signed(i64),
}

impl KeyId {
    fn into_string(self) -> String {
        match self {
            Self::Text(kid) => kid,
            Self::Index(kid) => kid.to_string(),
            Self::Signed(kid) => kid.to_string(),
        }
    }
}

/// Token header fields needed to pick and use a signing certificate.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Header {
    pub(crate) kid: Option<String>,
    pub(crate) alg: JwtAlg,
}

/// Decodes header and payload of a signed `token` without verifying anything.
///
/// Unlike the public parsing helpers this requires the signature segment.
pub(crate) fn decode_unverified(token: &str) -> Result<(Header, Claims), TokenError> {
    if token.split('.').count() != 3 {
        return Err(TokenError::InvalidJwtFormat);
    }
    let (header_b64, claims_b64) = split_segments(token)?;

    let raw: RawHeader = decode_segment(header_b64)?;
    let alg = JwtAlg::parse(&raw.alg).ok_or(TokenError::UnsupportedAlgorithm(raw.alg))?;
    let claims: Claims = decode_segment(claims_b64)?;

    Ok((
        Header {
            kid: raw.kid.map(KeyId::into_string),
            alg,
        },
        claims,
    ))
}

/// Decodes the payload of an access token without verifying it.
///
/// IMPORTANT: no signature or expiry check is performed. The returned claims are
/// untrusted; use [`TokenVerifier::verify`](crate::TokenVerifier::verify) to
/// authenticate a token.
///
/// # Errors
///
/// Returns a [`TokenError`] of kind [`TokenMalformed`](crate::ErrorKind::TokenMalformed)
/// if the token has fewer than two dot-separated segments, or the payload is not
/// base64url-encoded JSON with the expected claim types.
pub fn parse_token_details(token: &str) -> Result<Claims, TokenError> {
    let (_, claims_b64) = split_segments(token)?;
    decode_segment(claims_b64)
}

/// Decodes the payload of a refresh token without verifying it.
///
/// IMPORTANT: no signature or expiry check is performed.
///
/// # Errors
///
/// Same as [`parse_token_details`].
pub fn parse_refresh_token_details(token: &str) -> Result<RefreshTokenClaims, TokenError> {
    let (_, claims_b64) = split_segments(token)?;
    decode_segment(claims_b64)
}

fn split_segments(token: &str) -> Result<(&str, &str), TokenError> {
    let mut it = token.split('.');
    let header = it.next().ok_or(TokenError::InvalidJwtFormat)?;
    let claims = it.next().ok_or(TokenError::InvalidJwtFormat)?;
    Ok((header, claims))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let json = decode_b64url_to_vec(segment)?;
    serde_json::from_slice(&json).map_err(TokenError::InvalidJson)
}

/// Maximum size for a token segment (header or claims) after base64url decoding.
const MAX_JWT_SEGMENT_SIZE: usize = 64 * 1024;

/// Decode base64url into bytes. Trailing padding is tolerated.
fn decode_b64url_to_vec(input: &str) -> Result<Vec<u8>, TokenError> {
    use base64ct::{Base64UrlUnpadded, Encoding as _};

    let input = input.trim_end_matches('=');

    // Reject obviously oversized inputs before attempting to decode.
    if input.len() > MAX_JWT_SEGMENT_SIZE * 4 / 3 {
        return Err(TokenError::InvalidBase64);
    }

    Base64UrlUnpadded::decode_vec(input).map_err(|_| TokenError::InvalidBase64)
}
