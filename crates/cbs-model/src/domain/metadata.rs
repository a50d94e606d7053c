use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime fact served by the instance metadata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataKey {
    /// Cloud region of the instance (e.g. `ap-guangzhou`).
    Region,
    /// Availability zone of the instance (e.g. `ap-guangzhou-3`).
    Zone,
    /// Instance identifier (e.g. `ins-abcdefgh`), used as the CSI node id.
    InstanceId,
}

impl MetadataKey {
    /// Path of the fact relative to the metadata service base URL.
    pub const fn path(&self) -> &'static str {
        match self {
            MetadataKey::Region => "placement/region",
            MetadataKey::Zone => "placement/zone",
            MetadataKey::InstanceId => "instance-id",
        }
    }

    /// Label value for metrics and logs.
    pub const fn as_label(&self) -> &'static str {
        match self {
            MetadataKey::Region => "region",
            MetadataKey::Zone => "zone",
            MetadataKey::InstanceId => "instance_id",
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
