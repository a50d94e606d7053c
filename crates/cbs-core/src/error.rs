use thiserror::Error;

use cbs_model::{ComponentRole, MetadataKey, ModelError};

use crate::{
    metadata::MetadataError,
    service::{RpcError, ServiceError},
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ModelError),

    #[error("failed to resolve {key} from metadata service: {source}")]
    Metadata {
        key: MetadataKey,
        source: MetadataError,
    },

    #[error("role mismatch: configured as {configured}, service built for {service}")]
    RoleMismatch {
        configured: ComponentRole,
        service: ComponentRole,
    },

    #[error("failed to load persisted controller state: {0}")]
    StateLoad(#[source] ServiceError),

    #[error("supervisor error: {0}")]
    Supervisor(String),

    #[error("rpc server error: {0}")]
    Rpc(#[from] RpcError),
}
