use crate::metrics::backend::{MetricsBackend, Outcome};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_tag_sync(&self, _: Outcome, _: u64) {}

    #[inline(always)]
    fn record_service_failure(&self, _: &str) {}

    #[inline(always)]
    fn record_metadata_fetch(&self, _: &str, _: Outcome) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Success.as_label(), "success");
        assert_eq!(Outcome::Failure.as_label(), "failure");
        assert_eq!(Outcome::from_result::<(), ()>(&Err(())), Outcome::Failure);
    }
}
