//! Typed token payloads.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::marker::PhantomData;
use time::OffsetDateTime;

/// Value of the `token_class` claim.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TokenClass {
    /// `access_token`: carries audience and group claims used for authorization.
    Access,
    /// `refresh_token`: only used to obtain new access tokens.
    Refresh,
    /// Any other value issued by the provider.
    Other(String),
}

impl TokenClass {
    /// Returns the claim value as issued.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for TokenClass {
    fn from(value: &str) -> Self {
        match value {
            "access_token" => Self::Access,
            "refresh_token" => Self::Refresh,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded payload of an access token.
///
/// Claims absent from the payload are `None` (or empty for the list claims);
/// nothing is inferred. Only trustworthy when returned by
/// [`TokenVerifier::verify`](crate::TokenVerifier::verify).
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_seq_string",
        skip_serializing_if = "Vec::is_empty"
    )]
    aud: Vec<String>,
    #[serde(
        default,
        deserialize_with = "string_or_seq_string",
        skip_serializing_if = "Vec::is_empty"
    )]
    groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    iat: Option<i64>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    exp: Option<i64>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
}

impl Claims {
    /// Returns the token ID (`jti`).
    pub fn token_id(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    /// Returns the subject (`sub`).
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Returns the audience (`aud`), whether issued as a string or a list.
    pub fn audience(&self) -> &[String] {
        &self.aud
    }

    /// Returns the group memberships (`groups`).
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns the issuer (`iss`).
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    /// Returns the issued-at time (`iat`) in seconds since the Unix epoch.
    pub const fn issued_at(&self) -> Option<i64> {
        self.iat
    }

    /// Returns the expiry (`exp`) in seconds since the Unix epoch.
    pub const fn expires_at(&self) -> Option<i64> {
        self.exp
    }

    /// Returns the expiry as a timestamp, if present and representable.
    pub fn expiry(&self) -> Option<OffsetDateTime> {
        self.exp
            .and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
    }

    /// Returns the not-before time (`nbf`) in seconds since the Unix epoch.
    pub const fn not_before(&self) -> Option<i64> {
        self.nbf
    }

    /// Returns the scope string (`scope`).
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Returns the token type (`token_type`), e.g. `Bearer`.
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Returns the token class (`token_class`).
    pub fn token_class(&self) -> Option<TokenClass> {
        self.token_class.as_deref().map(TokenClass::from)
    }

    /// Returns the tenant (`tenant`).
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }
}

/// Decoded payload of a refresh token.
///
/// Refresh tokens carry a single audience and no group claim.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    iat: Option<i64>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
}

impl RefreshTokenClaims {
    /// Returns the token ID (`jti`).
    pub fn token_id(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    /// Returns the subject (`sub`).
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Returns the audience (`aud`).
    pub fn audience(&self) -> Option<&str> {
        self.aud.as_deref()
    }

    /// Returns the issuer (`iss`).
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    /// Returns the issued-at time (`iat`) in seconds since the Unix epoch.
    pub const fn issued_at(&self) -> Option<i64> {
        self.iat
    }

    /// Returns the expiry (`exp`) in seconds since the Unix epoch.
    pub const fn expires_at(&self) -> Option<i64> {
        self.exp
    }

    /// Returns the scope string (`scope`).
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Returns the token type (`token_type`).
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Returns the token class (`token_class`).
    pub fn token_class(&self) -> Option<TokenClass> {
        self.token_class.as_deref().map(TokenClass::from)
    }

    /// Returns the tenant (`tenant`).
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }
}

// Deserialize 'aud' and 'groups' claims being either a String or a sequence of strings.
fn string_or_seq_string<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec(PhantomData<Vec<String>>);

    impl<'de> de::Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("string or sequence of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_owned()])
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_seq<S>(self, visitor: S) -> Result<Self::Value, S::Error>
        where
            S: de::SeqAccess<'de>,
        {
            Deserialize::deserialize(de::value::SeqAccessDeserializer::new(visitor))
        }
    }

    deserializer.deserialize_any(StringOrVec(PhantomData))
}

// NumericDate claims may be encoded as integers or floats; fractions are truncated.
fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumericDate;

    impl de::Visitor<'_> for NumericDate {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("seconds since the Unix epoch")
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i64::try_from(v)
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_finite() && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                Ok(Some(v as i64))
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(NumericDate)
}
