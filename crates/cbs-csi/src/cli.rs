use clap::{ArgAction, Parser};

use cbs_model::{
    ConfigInput, DEFAULT_CBS_URL, DEFAULT_ENDPOINT, DEFAULT_METADATA_URL, DEFAULT_METRIC_PORT,
    DEFAULT_TAG_SYNC_INTERVAL_MINUTES,
};

/// Default location of the controller cache file.
pub const DEFAULT_METADATA_STORE: &str = "/var/lib/csi-cbs/metadata.json";

/// CBS CSI driver.
#[derive(Debug, Parser)]
#[command(name = "cbs-csi", version)]
pub struct Args {
    /// CSI endpoint (`unix:///path` or `tcp://host:port`).
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Region of the instance; queried from the metadata service when empty.
    #[arg(long, default_value = "")]
    pub region: String,

    /// Availability zone of the instance; queried from the metadata service when empty.
    #[arg(long, default_value = "")]
    pub zone: String,

    #[arg(long = "nodeID", default_value = "")]
    pub node_id: String,

    /// CBS API domain.
    #[arg(long = "cbs_url", default_value = DEFAULT_CBS_URL)]
    pub cbs_url: String,

    /// Maximum volumes attachable per node; negative selects the built-in default.
    #[arg(long = "volume_attach_limit", default_value_t = -1, allow_negative_numbers = true)]
    pub volume_attach_limit: i64,

    #[arg(long = "enable_metrics_server", default_value_t = true, action = ArgAction::Set)]
    pub enable_metrics_server: bool,

    #[arg(long = "metric_port", default_value_t = DEFAULT_METRIC_PORT)]
    pub metric_port: u16,

    /// Upper bound (minutes) of the random delay between tag reconciliations.
    #[arg(
        long = "time-interval",
        default_value_t = DEFAULT_TAG_SYNC_INTERVAL_MINUTES,
        allow_negative_numbers = true
    )]
    pub time_interval: i64,

    /// `controller` or `node`; derived from the environment when empty.
    #[arg(long = "component_type", default_value = "")]
    pub component_type: String,

    /// Orchestration API server URL (out-of-cluster only).
    #[arg(long, default_value = "")]
    pub master: String,

    /// Kubeconfig path (out-of-cluster only).
    #[arg(long, default_value = "")]
    pub kubeconfig: String,

    /// Base URL of the instance metadata service.
    #[arg(long = "metadata_url", default_value = DEFAULT_METADATA_URL)]
    pub metadata_url: String,

    /// Controller cache file, loaded once at startup.
    #[arg(long = "metadata_store", default_value = DEFAULT_METADATA_STORE)]
    pub metadata_store: String,

    /// Program run once per tag reconciliation pass; passes are no-ops when empty.
    #[arg(long = "tag_sync_command", default_value = "")]
    pub tag_sync_command: String,

    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    /// `text`, `json` or `journald`.
    #[arg(long = "log-format", default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// Explicit configuration values handed to the resolver.
    pub fn config_input(&self) -> ConfigInput {
        ConfigInput {
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            zone: self.zone.clone(),
            node_id: self.node_id.clone(),
            cbs_url: self.cbs_url.clone(),
            volume_attach_limit: self.volume_attach_limit,
            enable_metrics_server: self.enable_metrics_server,
            metric_port: self.metric_port,
            tag_sync_interval_minutes: self.time_interval,
            component_type: self.component_type.clone(),
            master: self.master.clone(),
            kubeconfig: self.kubeconfig.clone(),
        }
    }
}
