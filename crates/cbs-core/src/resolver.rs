//! Runtime configuration resolution.
//!
//! Every identity field is taken from the first source that has it:
//! 1. explicit (non-empty) input;
//! 2. environment variable, when one exists for the field;
//! 3. the instance metadata service.
//!
//! Any metadata failure aborts resolution. Nothing is started before a complete
//! [`RuntimeConfig`] exists.
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use cbs_model::{
    ClusterClientSource, ComponentRole, ConfigInput, ENV_CLUSTER_ID, ENV_NODE_ID, Endpoint, Env,
    MetadataKey, RuntimeConfig, TagSyncInterval, VolumeAttachLimit,
};

use crate::{
    error::CoreError,
    metadata::MetadataSource,
    metrics::{MetricsHandle, Outcome, noop_metrics},
    selector::select_role,
};

/// Resolves [`ConfigInput`] into an immutable [`RuntimeConfig`].
pub struct ConfigResolver {
    source: Arc<dyn MetadataSource>,
    env: Env,
    metrics: MetricsHandle,
}

impl ConfigResolver {
    /// Create a resolver over a metadata source and an environment snapshot.
    pub fn new(source: Arc<dyn MetadataSource>, env: Env) -> Self {
        Self {
            source,
            env,
            metrics: noop_metrics(),
        }
    }

    /// Attach a metrics backend for metadata lookups.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Produce the runtime configuration.
    ///
    /// Syntax errors in the input (role, endpoint, interval) are reported before any
    /// metadata lookup happens.
    #[instrument(level = "debug", skip_all)]
    pub async fn resolve(&self, input: &ConfigInput) -> Result<RuntimeConfig, CoreError> {
        let explicit_role = ComponentRole::from_flag(&input.component_type)?;
        let endpoint: Endpoint = input.endpoint.parse()?;
        let tag_sync_interval = TagSyncInterval::from_minutes(input.tag_sync_interval_minutes)?;

        let role = select_role(explicit_role, &self.env);

        let region = match non_blank(&input.region) {
            Some(v) => v.to_string(),
            None => self.fetch(MetadataKey::Region).await?,
        };
        let zone = match non_blank(&input.zone) {
            Some(v) => v.to_string(),
            None => self.fetch(MetadataKey::Zone).await?,
        };
        let node_id = self.resolve_node_id(input, role).await?;

        let cluster_id = self
            .env
            .non_empty(ENV_CLUSTER_ID)
            .map(str::to_string)
            .unwrap_or_default();
        if cluster_id.is_empty() {
            warn!("{ENV_CLUSTER_ID} is not set; tag reconciliation will run with an empty cluster id");
        }

        let cfg = RuntimeConfig {
            endpoint,
            region,
            zone,
            node_id,
            cbs_url: input.cbs_url.trim().to_string(),
            cluster_id,
            role,
            volume_attach_limit: VolumeAttachLimit::new(input.volume_attach_limit),
            enable_metrics_server: input.enable_metrics_server,
            metric_port: input.metric_port,
            tag_sync_interval,
            cluster_client: ClusterClientSource::from_flags(&input.master, &input.kubeconfig),
        };
        info!(%cfg, "runtime configuration resolved");
        Ok(cfg)
    }

    async fn resolve_node_id(
        &self,
        input: &ConfigInput,
        role: ComponentRole,
    ) -> Result<Option<String>, CoreError> {
        if let Some(v) = non_blank(&input.node_id) {
            return Ok(Some(v.to_string()));
        }
        if let Some(v) = self.env.non_empty(ENV_NODE_ID) {
            debug!(node_id = v, "node id taken from {ENV_NODE_ID}");
            return Ok(Some(v.to_string()));
        }
        match role {
            ComponentRole::Node => self.fetch(MetadataKey::InstanceId).await.map(Some),
            ComponentRole::Controller => Ok(None),
        }
    }

    async fn fetch(&self, key: MetadataKey) -> Result<String, CoreError> {
        let res = self.source.fetch(key).await;
        self.metrics
            .record_metadata_fetch(key.as_label(), Outcome::from_result(&res));

        match res {
            Ok(value) => {
                debug!(%key, %value, "resolved from metadata service");
                Ok(value)
            }
            Err(source) => Err(CoreError::Metadata { key, source }),
        }
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}
