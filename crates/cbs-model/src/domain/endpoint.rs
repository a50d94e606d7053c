use std::{fmt, path::PathBuf, str::FromStr};

use crate::error::{ModelError, ModelResult};

/// RPC listen address.
///
/// Accepted forms:
/// - `unix:///var/lib/kubelet/plugins/<driver>/csi.sock` (also `unix:/path`)
/// - `tcp://0.0.0.0:10000`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl FromStr for Endpoint {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        let raw = s.trim();
        let lower = raw.to_ascii_lowercase();

        if lower.starts_with("unix:") {
            let path = raw["unix:".len()..].trim_start_matches("//");
            if path.is_empty() {
                return Err(ModelError::InvalidEndpoint(s.to_string()));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if lower.starts_with("tcp://") {
            let addr = &raw["tcp://".len()..];
            if addr.is_empty() {
                return Err(ModelError::InvalidEndpoint(s.to_string()));
            }
            return Ok(Endpoint::Tcp(addr.to_string()));
        }
        Err(ModelError::InvalidEndpoint(s.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}
