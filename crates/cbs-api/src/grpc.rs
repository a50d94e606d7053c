use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, transport::Server};
use tracing::{debug, info};

use cbs_core::{NodeService, RoleService, RpcError, RpcServer};
use cbs_model::{DRIVER_NAME, DRIVER_VERSION, Endpoint, TOPOLOGY_ZONE_KEY};

use crate::proto::{
    self,
    controller_server::{Controller, ControllerServer},
    identity_server::{Identity, IdentityServer},
    node_server::{Node, NodeServer},
    plugin_capability::service::Type as PluginService,
};

/// CSI Identity service.
pub struct IdentityApi {
    service: RoleService,
}

impl IdentityApi {
    pub fn new(service: RoleService) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl Identity for IdentityApi {
    async fn get_plugin_info(
        &self,
        _request: Request<proto::GetPluginInfoRequest>,
    ) -> Result<Response<proto::GetPluginInfoResponse>, Status> {
        Ok(Response::new(proto::GetPluginInfoResponse {
            name: DRIVER_NAME.to_string(),
            vendor_version: DRIVER_VERSION.to_string(),
            manifest: HashMap::new(),
        }))
    }

    async fn get_plugin_capabilities(
        &self,
        _request: Request<proto::GetPluginCapabilitiesRequest>,
    ) -> Result<Response<proto::GetPluginCapabilitiesResponse>, Status> {
        let capabilities = [
            PluginService::ControllerService,
            PluginService::VolumeAccessibilityConstraints,
        ]
        .into_iter()
        .map(|t| proto::PluginCapability {
            r#type: Some(proto::plugin_capability::Type::Service(
                proto::plugin_capability::Service { r#type: t as i32 },
            )),
        })
        .collect();

        Ok(Response::new(proto::GetPluginCapabilitiesResponse { capabilities }))
    }

    async fn probe(
        &self,
        _request: Request<proto::ProbeRequest>,
    ) -> Result<Response<proto::ProbeResponse>, Status> {
        debug!(role = %self.service.role(), "probe");
        Ok(Response::new(proto::ProbeResponse {
            ready: Some(proto::BoolValue { value: true }),
        }))
    }
}

/// CSI Controller service.
///
/// Only the capability query is served here, so no RPC capability is advertised.
#[derive(Debug, Default)]
pub struct ControllerApi;

#[tonic::async_trait]
impl Controller for ControllerApi {
    async fn controller_get_capabilities(
        &self,
        _request: Request<proto::ControllerGetCapabilitiesRequest>,
    ) -> Result<Response<proto::ControllerGetCapabilitiesResponse>, Status> {
        Ok(Response::new(proto::ControllerGetCapabilitiesResponse {
            capabilities: Vec::new(),
        }))
    }
}

/// CSI Node service. Advertises no RPC capability; stage and stats RPCs are not served.
pub struct NodeApi {
    service: Arc<dyn NodeService>,
}

impl NodeApi {
    pub fn new(service: Arc<dyn NodeService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl Node for NodeApi {
    async fn node_get_capabilities(
        &self,
        _request: Request<proto::NodeGetCapabilitiesRequest>,
    ) -> Result<Response<proto::NodeGetCapabilitiesResponse>, Status> {
        Ok(Response::new(proto::NodeGetCapabilitiesResponse {
            capabilities: Vec::new(),
        }))
    }

    async fn node_get_info(
        &self,
        _request: Request<proto::NodeGetInfoRequest>,
    ) -> Result<Response<proto::NodeGetInfoResponse>, Status> {
        let node_id = self.service.node_id();
        if node_id.is_empty() {
            return Err(Status::failed_precondition("node id is not configured"));
        }

        let segments = HashMap::from([(
            TOPOLOGY_ZONE_KEY.to_string(),
            self.service.zone().to_string(),
        )]);
        Ok(Response::new(proto::NodeGetInfoResponse {
            node_id: node_id.to_string(),
            max_volumes_per_node: self.service.max_volumes_per_node(),
            accessible_topology: Some(proto::Topology { segments }),
        }))
    }
}

/// tonic-based CSI server.
#[derive(Debug, Default)]
pub struct CsiGrpcServer;

#[async_trait]
impl RpcServer for CsiGrpcServer {
    async fn serve(
        &self,
        endpoint: &Endpoint,
        service: RoleService,
        shutdown: CancellationToken,
    ) -> Result<(), RpcError> {
        let identity = IdentityServer::new(IdentityApi::new(service.clone()));

        let mut builder = Server::builder();
        let router = match service {
            RoleService::Controller(_) => builder
                .add_service(identity)
                .add_service(ControllerServer::new(ControllerApi)),
            RoleService::Node(node) => builder
                .add_service(identity)
                .add_service(NodeServer::new(NodeApi::new(node))),
        };

        match endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let listener = unix::bind(path).map_err(|e| RpcError::Bind {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })?;
                info!(%endpoint, "csi server listening");

                router
                    .serve_with_incoming_shutdown(
                        tokio_stream::wrappers::UnixListenerStream::new(listener),
                        shutdown.cancelled(),
                    )
                    .await
                    .map_err(|e| RpcError::Transport(e.to_string()))
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(RpcError::Bind {
                endpoint: endpoint.to_string(),
                reason: "unix sockets are not supported on this platform".into(),
            }),
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr.as_str())
                    .await
                    .map_err(|e| RpcError::Bind {
                        endpoint: endpoint.to_string(),
                        reason: e.to_string(),
                    })?;
                info!(%endpoint, "csi server listening");

                router
                    .serve_with_incoming_shutdown(
                        TcpListenerStream::new(listener),
                        shutdown.cancelled(),
                    )
                    .await
                    .map_err(|e| RpcError::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(unix)]
mod unix {
    use std::{io, path::Path};

    use tokio::net::UnixListener;
    use tracing::debug;

    /// Bind a unix socket, replacing a stale socket file left by a previous run.
    pub(super) fn bind(path: &Path) -> io::Result<UnixListener> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed stale socket"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        UnixListener::bind(path)
    }
}
