//! Startup check of the orchestration-platform client settings.
use std::path::Path;

use anyhow::{Context, bail};
use tracing::info;

use cbs_model::{ClusterClientSource, Env};

const ENV_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";
const ENV_SERVICE_PORT: &str = "KUBERNETES_SERVICE_PORT";

/// Fail fast when the cluster client cannot be configured.
///
/// In-cluster needs the service host/port injected into every pod; out-of-cluster needs
/// the kubeconfig file (when given) to exist.
pub fn check_cluster_client(source: &ClusterClientSource, env: &Env) -> anyhow::Result<()> {
    match source {
        ClusterClientSource::InCluster => {
            let host = env.non_empty(ENV_SERVICE_HOST);
            let port = env.non_empty(ENV_SERVICE_PORT);
            match (host, port) {
                (Some(host), Some(port)) => {
                    info!(%host, %port, "using in-cluster client config");
                    Ok(())
                }
                _ => bail!(
                    "in-cluster config unavailable: {ENV_SERVICE_HOST} and {ENV_SERVICE_PORT} must be set (or pass --master/--kubeconfig)"
                ),
            }
        }
        ClusterClientSource::OutOfCluster { master, kubeconfig } => {
            if let Some(path) = kubeconfig {
                check_kubeconfig(path)?;
            }
            info!(
                master = master.as_deref().unwrap_or(""),
                kubeconfig = kubeconfig.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
                "using out-of-cluster client config"
            );
            Ok(())
        }
    }
}

fn check_kubeconfig(path: &Path) -> anyhow::Result<()> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("kubeconfig {} is not readable", path.display()))?;
    if !meta.is_file() {
        bail!("kubeconfig {} is not a file", path.display());
    }
    Ok(())
}
