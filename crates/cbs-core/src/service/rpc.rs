use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use cbs_model::Endpoint;

use super::{RoleService, RpcError};

/// Main RPC server of the driver.
#[async_trait]
pub trait RpcServer: Send + Sync {
    /// Serve identity plus the role's service on `endpoint`.
    ///
    /// Blocks until `shutdown` is cancelled or the transport fails.
    async fn serve(
        &self,
        endpoint: &Endpoint,
        service: RoleService,
        shutdown: CancellationToken,
    ) -> Result<(), RpcError>;
}
