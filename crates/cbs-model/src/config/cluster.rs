use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the orchestration-platform client takes its connection settings from.
///
/// Building the client itself is the platform library's job; this only records the choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "source")]
pub enum ClusterClientSource {
    /// Service-account credentials mounted into the pod.
    InCluster,
    /// Explicit API server URL and/or kubeconfig file.
    OutOfCluster {
        master: Option<String>,
        kubeconfig: Option<PathBuf>,
    },
}

impl ClusterClientSource {
    /// `InCluster` unless `master` or `kubeconfig` is non-empty.
    pub fn from_flags(master: &str, kubeconfig: &str) -> Self {
        let master = Some(master.trim()).filter(|s| !s.is_empty());
        let kubeconfig = Some(kubeconfig.trim())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        if master.is_none() && kubeconfig.is_none() {
            return ClusterClientSource::InCluster;
        }
        ClusterClientSource::OutOfCluster {
            master: master.map(str::to_string),
            kubeconfig,
        }
    }
}
