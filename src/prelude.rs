// Logging facade for the rest of the crate.
// `debug!`, `info!` and `warn!` resolve to `tracing`, `log`, or a no-op
// depending on enabled features.

#[allow(unused_imports, reason = "not every macro is used under every feature set")]
pub(crate) use crate::observability::{log_debug as debug, log_info as info, log_warn as warn};
