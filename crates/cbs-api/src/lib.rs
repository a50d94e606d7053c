//! Network surfaces of the driver.
//!
//! - `http`: the `/metrics` exporter, run as a supervised background service.
//! - `grpc`: the CSI server (Identity plus the role's Controller or Node service).
mod error;
pub use error::ApiError;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{METRICS_RESTART_DELAY_MS, METRICS_SERVICE_NAME, MetricsServer, metrics_router};

#[cfg(feature = "grpc")]
pub mod proto {
    tonic::include_proto!("csi.v1");
}

#[cfg(feature = "grpc")]
mod grpc;
#[cfg(feature = "grpc")]
pub use grpc::{ControllerApi, CsiGrpcServer, IdentityApi, NodeApi};
