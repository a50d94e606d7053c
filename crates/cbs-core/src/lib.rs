pub mod driver;
pub mod error;
pub mod map;
pub mod metadata;
pub mod metrics;
pub mod resolver;
pub mod selector;
pub mod service;
pub mod supervisor;
pub mod tagsync;

pub use driver::{BackgroundService, Driver, RunOptions};
pub use error::CoreError;
pub use metadata::{MetadataError, MetadataSource};
pub use metrics::{MetricsBackend, MetricsHandle, NoOpMetrics, Outcome, noop_metrics};
pub use resolver::ConfigResolver;
pub use selector::select_role;
pub use service::{
    ControllerService, NodeService, ReconcileError, RoleService, RpcError, RpcServer,
    ServiceError, TagReconciler, TagSyncRequest,
};
pub use supervisor::SupervisorApi;
pub use tagsync::{TAG_SYNC_SERVICE_NAME, TagSyncScheduler};

#[cfg(feature = "metadata-http")]
pub use metadata::HttpMetadataSource;
