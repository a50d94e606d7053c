use crate::{
    DEFAULT_CBS_URL, DEFAULT_ENDPOINT, DEFAULT_METRIC_PORT, DEFAULT_TAG_SYNC_INTERVAL_MINUTES,
};

/// Explicit (caller-supplied) configuration values, before resolution.
///
/// This is the highest-priority source of the resolver: a non-empty string here is used verbatim.
/// Empty strings mean "not supplied" and let the resolver fall through to the environment
/// snapshot and then to the metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigInput {
    pub endpoint: String,
    pub region: String,
    pub zone: String,
    pub node_id: String,
    pub cbs_url: String,
    pub volume_attach_limit: i64,
    pub enable_metrics_server: bool,
    pub metric_port: u16,
    pub tag_sync_interval_minutes: i64,
    pub component_type: String,
    pub master: String,
    pub kubeconfig: String,
}

impl Default for ConfigInput {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: String::new(),
            zone: String::new(),
            node_id: String::new(),
            cbs_url: DEFAULT_CBS_URL.to_string(),
            volume_attach_limit: -1,
            enable_metrics_server: true,
            metric_port: DEFAULT_METRIC_PORT,
            tag_sync_interval_minutes: DEFAULT_TAG_SYNC_INTERVAL_MINUTES,
            component_type: String::new(),
            master: String::new(),
            kubeconfig: String::new(),
        }
    }
}
