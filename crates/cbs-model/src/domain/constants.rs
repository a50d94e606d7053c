//! Well-known names and defaults of the CBS CSI driver.
//!
//! Flag defaults live here so the CLI, the resolver and the tests agree on a single value.

/// CSI driver name reported by `GetPluginInfo`.
pub const DRIVER_NAME: &str = "com.tencent.cloud.csi.cbs";

/// CSI driver version reported by `GetPluginInfo`.
pub const DRIVER_VERSION: &str = "v1.0.0";

/// Topology segment key carrying the availability zone of a node.
pub const TOPOLOGY_ZONE_KEY: &str = "topology.com.tencent.cloud.csi.cbs/zone";

/// Default RPC endpoint: the kubelet plugin socket of this driver.
pub const DEFAULT_ENDPOINT: &str =
    "unix:///var/lib/kubelet/plugins/com.tencent.cloud.csi.cbs/csi.sock";

/// Default CBS API domain.
pub const DEFAULT_CBS_URL: &str = "cbs.internal.tencentcloudapi.com";

/// Default base URL of the instance metadata service.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.tencentyun.com/latest/meta-data";

/// Default port of the `/metrics` endpoint.
pub const DEFAULT_METRIC_PORT: u16 = 9099;

/// Default upper bound (minutes) of the tag sync jitter.
pub const DEFAULT_TAG_SYNC_INTERVAL_MINUTES: i64 = 60;

/// Attach limit used when the configured value is negative.
pub const DEFAULT_VOLUME_ATTACH_LIMIT: i64 = 20;

/// Environment variable carrying the cluster identifier.
pub const ENV_CLUSTER_ID: &str = "CLUSTER_ID";

/// Environment variable whose presence selects the controller role.
pub const ENV_ADDRESS: &str = "ADDRESS";

/// Environment variable carrying the node identifier.
pub const ENV_NODE_ID: &str = "NODE_ID";
