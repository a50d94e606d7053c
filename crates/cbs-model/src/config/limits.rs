use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_TAG_SYNC_INTERVAL_MINUTES, DEFAULT_VOLUME_ATTACH_LIMIT,
    error::{ModelError, ModelResult},
};

/// Maximum number of volumes attachable to one node.
///
/// Negative values (the flag default is `-1`) select [`DEFAULT_VOLUME_ATTACH_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeAttachLimit(i64);

impl VolumeAttachLimit {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Value reported to the orchestration platform.
    pub const fn effective(&self) -> i64 {
        if self.0 < 0 {
            DEFAULT_VOLUME_ATTACH_LIMIT
        } else {
            self.0
        }
    }
}

impl Default for VolumeAttachLimit {
    fn default() -> Self {
        Self(-1)
    }
}

/// Upper bound of the random delay between two tag reconciliations.
///
/// Always positive: zero and negative intervals are rejected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct TagSyncInterval(u32);

impl TagSyncInterval {
    pub fn from_minutes(minutes: i64) -> ModelResult<Self> {
        if minutes <= 0 {
            return Err(ModelError::InvalidInterval(minutes));
        }
        u32::try_from(minutes)
            .map(Self)
            .map_err(|_| ModelError::InvalidInterval(minutes))
    }

    pub const fn minutes(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0) * 60)
    }
}

impl Default for TagSyncInterval {
    fn default() -> Self {
        Self(DEFAULT_TAG_SYNC_INTERVAL_MINUTES as u32)
    }
}

impl TryFrom<i64> for TagSyncInterval {
    type Error = ModelError;
    fn try_from(minutes: i64) -> ModelResult<Self> {
        Self::from_minutes(minutes)
    }
}

impl From<TagSyncInterval> for i64 {
    fn from(v: TagSyncInterval) -> Self {
        i64::from(v.0)
    }
}

impl fmt::Display for TagSyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}
