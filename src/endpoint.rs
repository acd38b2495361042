//! Identity provider certificate endpoint location.

use thiserror::Error;
use url::Url;

/// Errors building a certificate endpoint URL.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EndpointError {
    /// The endpoint host is empty.
    #[error("identity provider endpoint is empty")]
    EmptyEndpoint,

    /// The tenant name is empty.
    #[error("tenant is empty")]
    EmptyTenant,

    /// The endpoint is not a valid URL authority.
    #[error("invalid identity provider endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The endpoint uses a scheme other than `http` or `https`.
    #[error("unsupported scheme '{0}' for identity provider endpoint")]
    UnsupportedScheme(String),
}

/// Builds the URL listing a tenant's token signing certificates.
///
/// `endpoint` is the identity provider host, optionally with a port and an
/// explicit `http://` or `https://` scheme; `https` is assumed otherwise.
/// The tenant name is percent-encoded as a path segment.
///
/// ```rust
/// use tokenverifier::certificate_url;
///
/// let url = certificate_url("idp.example.org", "example.org").unwrap();
/// assert_eq!(
///     url,
///     "https://idp.example.org/idm/tenant/example.org/certificates/?scope=TENANT"
/// );
/// ```
///
/// # Errors
///
/// Returns [`EndpointError`] if either argument is empty or the endpoint does
/// not form a valid `http`/`https` URL.
pub fn certificate_url(endpoint: &str, tenant: &str) -> Result<String, EndpointError> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.is_empty() {
        return Err(EndpointError::EmptyEndpoint);
    }
    if tenant.is_empty() {
        return Err(EndpointError::EmptyTenant);
    }

    let mut url = if endpoint.contains("://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("https://{endpoint}"))?
    };

    if !matches!(url.scheme(), "https" | "http") {
        return Err(EndpointError::UnsupportedScheme(url.scheme().to_owned()));
    }

    url.path_segments_mut()
        .map_err(|()| EndpointError::UnsupportedScheme(endpoint.to_owned()))?
        .pop_if_empty()
        .extend(["idm", "tenant", tenant, "certificates", ""]);
    url.set_query(Some("scope=TENANT"));

    Ok(url.into())
}
