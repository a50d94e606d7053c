//! Seams between the orchestration layer and the role-specific driver logic.
//!
//! Volume operations, cloud API calls and the CSI wire schema live behind these traits;
//! the core only decides *which* of them run and *when*.
mod error;
pub use error::{ReconcileError, RpcError, ServiceError};

mod rpc;
pub use rpc::RpcServer;

use std::sync::Arc;

use async_trait::async_trait;
use cbs_model::ComponentRole;

/// Input of a single tag reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSyncRequest {
    pub region: String,
    pub cluster_id: String,
}

/// Brings cloud-side volume tags in line with cluster state.
#[async_trait]
pub trait TagReconciler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Run one reconciliation pass.
    async fn reconcile(&self, req: &TagSyncRequest) -> Result<(), ReconcileError>;
}

/// Cluster-wide controller service.
#[async_trait]
pub trait ControllerService: Send + Sync {
    /// Load the persisted controller cache. Must succeed before traffic is accepted.
    async fn load_persisted_state(&self) -> Result<(), ServiceError>;

    /// Reconciler driven by the tag sync scheduler.
    fn tag_reconciler(&self) -> Arc<dyn TagReconciler>;
}

/// Per-node service.
pub trait NodeService: Send + Sync {
    fn node_id(&self) -> &str;

    fn zone(&self) -> &str;

    /// Maximum number of volumes attachable to this node.
    fn max_volumes_per_node(&self) -> i64;
}

/// The one role-specific service a process runs.
#[derive(Clone)]
pub enum RoleService {
    Controller(Arc<dyn ControllerService>),
    Node(Arc<dyn NodeService>),
}

impl RoleService {
    pub fn role(&self) -> ComponentRole {
        match self {
            RoleService::Controller(_) => ComponentRole::Controller,
            RoleService::Node(_) => ComponentRole::Node,
        }
    }
}

impl std::fmt::Debug for RoleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RoleService").field(&self.role()).finish()
    }
}
