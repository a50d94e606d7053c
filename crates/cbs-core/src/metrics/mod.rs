//! Metrics collection abstraction for the driver.
//!
//! Backends (prometheus, etc) implement [`MetricsBackend`] and are handed to the resolver,
//! the tag sync scheduler and the background services as a shared [`MetricsHandle`].
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, Outcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
