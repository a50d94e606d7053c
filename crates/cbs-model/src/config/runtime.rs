use std::fmt;

use crate::{
    config::{ClusterClientSource, TagSyncInterval, VolumeAttachLimit},
    domain::{ComponentRole, Endpoint},
};

/// Fully resolved runtime configuration of a driver process.
///
/// Built once by the resolver and then shared read-only (`Arc<RuntimeConfig>`) with every
/// component; there is no reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub endpoint: Endpoint,
    pub region: String,
    pub zone: String,
    /// Node identity; `None` for controllers that were not given one.
    pub node_id: Option<String>,
    /// CBS API domain.
    pub cbs_url: String,
    /// Cluster identifier used by tag reconciliation. May be empty.
    pub cluster_id: String,
    pub role: ComponentRole,
    pub volume_attach_limit: VolumeAttachLimit,
    pub enable_metrics_server: bool,
    pub metric_port: u16,
    pub tag_sync_interval: TagSyncInterval,
    pub cluster_client: ClusterClientSource,
}

impl RuntimeConfig {
    /// Node id, or an empty string when none was resolved.
    pub fn node_id_or_empty(&self) -> &str {
        self.node_id.as_deref().unwrap_or("")
    }
}

impl fmt::Display for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuntimeConfig(role={}, endpoint={}, region={}, zone={}, node_id={}, cluster_id={})",
            self.role,
            self.endpoint,
            self.region,
            self.zone,
            self.node_id_or_empty(),
            self.cluster_id,
        )
    }
}
