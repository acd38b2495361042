//! Default values used when a [`TokenVerifierBuilder`](crate::TokenVerifierBuilder)
//! setting is left unset.

use std::time::Duration;

/// Certificate set lifetime when the endpoint sends no usable `max-age`.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Timeout applied to each certificate endpoint request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Certificate index used for tokens whose header carries no `kid`.
pub const DEFAULT_KEY_INDEX: usize = 0;
