use super::errors::MetricsErrorKind;

/// Trait for recording metrics from [`CertificateCache`](super::CertificateCache).
///
/// Implement this trait to integrate with your metrics system (e.g., Prometheus, `StatsD`).
/// Prefer stable, low-cardinality labels when recording metrics.
///
/// # Example
///
/// ```no_run
/// use tokenverifier::{MetricsErrorKind, MetricsRecorder};
/// use std::sync::Arc;
///
/// struct MyMetrics;
///
/// impl MetricsRecorder for MyMetrics {
///     fn record_refresh(&self) {}
///
///     fn record_cache_hit(&self) {}
///
///     fn record_error(&self, kind: MetricsErrorKind) {
///         println!("Error: {}", kind.as_str());
///     }
/// }
///
/// let metrics = Arc::new(MyMetrics);
/// // Use with TokenVerifierBuilder::metrics()
/// ```
pub trait MetricsRecorder: Send + Sync {
    /// Records that a new certificate set was installed.
    fn record_refresh(&self);

    /// Records a certificate lookup served without fetching.
    fn record_cache_hit(&self);

    /// Records an error with a structured error kind.
    fn record_error(&self, kind: MetricsErrorKind);
}
