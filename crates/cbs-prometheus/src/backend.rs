use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use cbs_core::{MetricsBackend, Outcome};

/// Prometheus metrics backend.
///
/// All labels are bounded:
/// - `outcome`: "success", "failure"
/// - `service`: slot names of supervised services
/// - `key`: "region", "zone", "instance_id"
#[derive(Clone)]
pub struct PrometheusMetrics {
    tag_sync_total: CounterVec,
    tag_sync_duration: Histogram,
    service_failures: CounterVec,
    metadata_fetch_total: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register the driver metrics in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let tag_sync_total = CounterVec::new(
            Opts::new("cbs_tag_sync_total", "Tag reconciliation passes by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(tag_sync_total.clone()))?;

        let tag_sync_duration = Histogram::with_opts(
            HistogramOpts::new(
                "cbs_tag_sync_duration_seconds",
                "Duration of tag reconciliation passes in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0]),
        )?;
        registry.register(Box::new(tag_sync_duration.clone()))?;

        let service_failures = CounterVec::new(
            Opts::new(
                "cbs_service_failures_total",
                "Failed attempts of supervised background services",
            ),
            &["service"],
        )?;
        registry.register(Box::new(service_failures.clone()))?;

        let metadata_fetch_total = CounterVec::new(
            Opts::new(
                "cbs_metadata_fetch_total",
                "Instance metadata lookups during configuration resolution",
            ),
            &["key", "outcome"],
        )?;
        registry.register(Box::new(metadata_fetch_total.clone()))?;

        Ok(Self {
            tag_sync_total,
            tag_sync_duration,
            service_failures,
            metadata_fetch_total,
            registry,
        })
    }

    /// Create a backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_tag_sync(&self, outcome: Outcome, duration_ms: u64) {
        self.tag_sync_total
            .with_label_values(&[outcome.as_label()])
            .inc();
        self.tag_sync_duration.observe(duration_ms as f64 / 1000.0);
    }

    fn record_service_failure(&self, service: &str) {
        self.service_failures.with_label_values(&[service]).inc();
    }

    fn record_metadata_fetch(&self, key: &str, outcome: Outcome) {
        self.metadata_fetch_total
            .with_label_values(&[key, outcome.as_label()])
            .inc();
    }
}
