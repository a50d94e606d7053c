use std::sync::Arc;

/// Outcome of a single observed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }

    #[inline]
    pub fn from_result<T, E>(res: &Result<T, E>) -> Self {
        if res.is_ok() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Driver metrics collection interface.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record one tag reconciliation pass.
    ///
    /// # Arguments
    /// - `outcome`: whether the reconciler returned an error
    /// - `duration_ms`: wall time of the pass in milliseconds
    fn record_tag_sync(&self, outcome: Outcome, duration_ms: u64);

    /// Record a failed attempt of a supervised background service (e.g. listener bind failure).
    fn record_service_failure(&self, service: &str);

    /// Record a metadata service lookup made during configuration resolution.
    fn record_metadata_fetch(&self, key: &str, outcome: Outcome);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
