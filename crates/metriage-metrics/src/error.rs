/// Errors raised while reading a metrics snapshot.
///
/// Malformed individual lines are skipped by the parser; only I/O failures
/// surface here.
///
/// # Examples
///
/// ```rust
/// use metriage_metrics::error::MetricsError;
///
/// let err = MetricsError::Read {
///     path: "sensor-metrics.txt".to_string(),
///     source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
/// };
/// assert!(err.to_string().contains("sensor-metrics.txt"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The metrics file could not be opened or read.
    #[error("Metrics: failed to read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// Convenience `Result` alias for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;
