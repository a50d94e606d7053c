mod domain;
pub use domain::{ComponentRole, Endpoint, Env, KeyValue, MetadataKey, Slot};
pub use domain::{
    DEFAULT_CBS_URL, DEFAULT_ENDPOINT, DEFAULT_METADATA_URL, DEFAULT_METRIC_PORT,
    DEFAULT_TAG_SYNC_INTERVAL_MINUTES, DEFAULT_VOLUME_ATTACH_LIMIT, DRIVER_NAME, DRIVER_VERSION,
    ENV_ADDRESS, ENV_CLUSTER_ID, ENV_NODE_ID, TOPOLOGY_ZONE_KEY,
};

mod error;
pub use error::{ModelError, ModelResult};

mod config;
pub use config::{ClusterClientSource, ConfigInput, RuntimeConfig, TagSyncInterval, VolumeAttachLimit};

mod spec;
pub use spec::ServiceSpec;
