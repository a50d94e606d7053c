//! Prometheus metrics backend of the CBS CSI driver.
//!
//! [`PrometheusMetrics`] implements [`cbs_core::MetricsBackend`]; the `/metrics` endpoint in
//! `cbs-api` renders it with [`PrometheusMetrics::encode_text`].
//!
//! ## Metrics
//! - `cbs_tag_sync_total{outcome}` - Counter
//! - `cbs_tag_sync_duration_seconds` - Histogram
//! - `cbs_service_failures_total{service}` - Counter
//! - `cbs_metadata_fetch_total{key, outcome}` - Counter

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
