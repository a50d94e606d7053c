//! Controller cache: which volume is attached where, persisted as one JSON object.
use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::RwLock,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use cbs_core::ServiceError;

/// Attachment of one volume, keyed by volume id in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRecord {
    pub node_id: String,
    #[serde(default)]
    pub device_path: String,
}

/// JSON-file backed cache of [`AttachRecord`]s.
#[derive(Debug)]
pub struct FileCacheStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, AttachRecord>>,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file and replace the in-memory entries.
    ///
    /// A missing file yields an empty cache; any other read or parse failure is an error.
    pub async fn load(&self) -> Result<usize, ServiceError> {
        let entries: BTreeMap<String, AttachRecord> = match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| self.load_error(e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "cache file not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(self.load_error(e)),
        };

        for (volume, rec) in &entries {
            trace!(volume, node_id = %rec.node_id, device_path = %rec.device_path, "cached attachment");
        }
        let count = entries.len();
        *self.entries.write().unwrap_or_else(|e| e.into_inner()) = entries;
        debug!(path = %self.path.display(), count, "cache loaded");
        Ok(count)
    }

    #[cfg(test)]
    pub fn get(&self, volume_id: &str) -> Option<AttachRecord> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(volume_id)
            .cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn load_error(&self, e: impl std::fmt::Display) -> ServiceError {
        ServiceError::StateLoad {
            location: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}
