//! Role services of the driver process.
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use cbs_core::{ControllerService, NodeService, RoleService, ServiceError, TagReconciler};
use cbs_exec::CommandTagReconciler;
use cbs_model::{ComponentRole, Env, RuntimeConfig};

use crate::store::FileCacheStore;

/// Environment passed to every tag reconciliation command.
const ENV_CBS_URL: &str = "CBS_URL";
const ENV_KUBECONFIG: &str = "KUBECONFIG";

pub struct CbsController {
    store: FileCacheStore,
    reconciler: Arc<CommandTagReconciler>,
}

impl CbsController {
    pub fn new(store: FileCacheStore, reconciler: CommandTagReconciler) -> Self {
        Self {
            store,
            reconciler: Arc::new(reconciler),
        }
    }
}

#[async_trait]
impl ControllerService for CbsController {
    async fn load_persisted_state(&self) -> Result<(), ServiceError> {
        let volumes = self.store.load().await?;
        info!(path = %self.store.path().display(), volumes, "controller cache loaded");
        Ok(())
    }

    fn tag_reconciler(&self) -> Arc<dyn TagReconciler> {
        self.reconciler.clone()
    }
}

pub struct CbsNode {
    node_id: String,
    zone: String,
    max_volumes: i64,
}

impl CbsNode {
    pub fn from_config(cfg: &RuntimeConfig) -> Self {
        Self {
            node_id: cfg.node_id_or_empty().to_string(),
            zone: cfg.zone.clone(),
            max_volumes: cfg.volume_attach_limit.effective(),
        }
    }
}

impl NodeService for CbsNode {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    fn zone(&self) -> &str {
        &self.zone
    }

    fn max_volumes_per_node(&self) -> i64 {
        self.max_volumes
    }
}

/// Build the service of the resolved role.
pub fn build_role_service(
    cfg: &RuntimeConfig,
    store: FileCacheStore,
    reconciler: CommandTagReconciler,
) -> RoleService {
    match cfg.role {
        ComponentRole::Controller => {
            RoleService::Controller(Arc::new(CbsController::new(store, reconciler)))
        }
        ComponentRole::Node => RoleService::Node(Arc::new(CbsNode::from_config(cfg))),
    }
}

/// Base environment of the tag reconciliation command.
pub fn reconciler_env(cfg: &RuntimeConfig, kubeconfig: &str) -> Env {
    let env = Env::new().with(ENV_CBS_URL, cfg.cbs_url.as_str());
    if kubeconfig.trim().is_empty() {
        env
    } else {
        env.with(ENV_KUBECONFIG, kubeconfig.trim())
    }
}
