//! Role-aware startup sequence of the driver process.
//!
//! Order of operations:
//! 1. controller only: load persisted state (fatal on error);
//! 2. start the metrics exporter when enabled (failures are retried by the supervisor);
//! 3. controller only: start the tag sync scheduler;
//! 4. serve RPC until shutdown.
//!
//! Background services and the RPC server share one shutdown token; stopping the RPC server
//! for any reason cancels the background services too.
use std::sync::Arc;

use taskvisor::{Subscribe, TaskRef};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use cbs_model::{RuntimeConfig, ServiceSpec};

use crate::{
    error::CoreError,
    metrics::{MetricsHandle, noop_metrics},
    service::{RoleService, RpcServer, TagSyncRequest},
    supervisor::SupervisorApi,
    tagsync::TagSyncScheduler,
};

/// Background service that can be (re)built for the supervisor.
pub trait BackgroundService: Send + Sync {
    fn name(&self) -> &'static str;

    /// Build the task body and its supervision spec. The body must return once `shutdown` fires.
    fn build(&self, shutdown: CancellationToken) -> (TaskRef, ServiceSpec);
}

/// Optional pieces plugged into [`Driver::run`].
#[derive(Default)]
pub struct RunOptions {
    /// Supervisor event subscribers (logging, etc).
    pub subscribers: Vec<Arc<dyn Subscribe>>,
    /// `/metrics` exporter, started when metrics are enabled.
    pub metrics_exporter: Option<Arc<dyn BackgroundService>>,
    /// Fixed seed for the tag sync jitter.
    pub tag_sync_seed: Option<u64>,
}

/// Orchestrates the services of one driver process.
pub struct Driver {
    cfg: Arc<RuntimeConfig>,
    service: RoleService,
    metrics: MetricsHandle,
}

impl Driver {
    /// Pair the resolved configuration with the role service built for it.
    pub fn new(cfg: Arc<RuntimeConfig>, service: RoleService) -> Result<Self, CoreError> {
        if cfg.role != service.role() {
            return Err(CoreError::RoleMismatch {
                configured: cfg.role,
                service: service.role(),
            });
        }
        Ok(Self {
            cfg,
            service,
            metrics: noop_metrics(),
        })
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.cfg
    }

    /// Start everything and block on the RPC server.
    #[instrument(level = "debug", skip_all, fields(role = %self.cfg.role))]
    pub async fn run(
        self,
        opts: RunOptions,
        rpc: &dyn RpcServer,
        shutdown: CancellationToken,
    ) -> Result<(), CoreError> {
        if let RoleService::Controller(ctrl) = &self.service {
            ctrl.load_persisted_state()
                .await
                .map_err(CoreError::StateLoad)?;
            info!("controller state loaded");
        }

        let sup = SupervisorApi::new(opts.subscribers).await?;

        if self.cfg.enable_metrics_server {
            match &opts.metrics_exporter {
                Some(exporter) => {
                    let (task, spec) = exporter.build(shutdown.child_token());
                    if let Err(e) = sup.start_service(task, &spec).await {
                        error!(service = exporter.name(), error = %e, "failed to start metrics exporter");
                    }
                }
                None => warn!("metrics server enabled but no exporter configured"),
            }
        }

        if let RoleService::Controller(ctrl) = &self.service {
            let request = TagSyncRequest {
                region: self.cfg.region.clone(),
                cluster_id: self.cfg.cluster_id.clone(),
            };
            let mut scheduler =
                TagSyncScheduler::new(self.cfg.tag_sync_interval, ctrl.tag_reconciler(), request)
                    .with_metrics(Arc::clone(&self.metrics));
            if let Some(seed) = opts.tag_sync_seed {
                scheduler = scheduler.with_seed(seed);
            }

            let (task, spec) = scheduler.into_service(shutdown.child_token());
            if let Err(e) = sup.start_service(task, &spec).await {
                error!(error = %e, "failed to start tag sync scheduler");
            }
        }

        info!(endpoint = %self.cfg.endpoint, "serving rpc");
        let res = rpc
            .serve(&self.cfg.endpoint, self.service.clone(), shutdown.clone())
            .await;

        shutdown.cancel();
        match &res {
            Ok(()) => info!("rpc server stopped"),
            Err(e) => error!(error = %e, "rpc server failed"),
        }
        res.map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use taskvisor::{TaskError, TaskFn};

    use cbs_model::{
        ClusterClientSource, ComponentRole, Endpoint, TagSyncInterval, VolumeAttachLimit,
    };

    use crate::service::{
        ControllerService, NodeService, ReconcileError, RpcError, ServiceError, TagReconciler,
    };

    fn config(role: ComponentRole, metrics: bool) -> Arc<RuntimeConfig> {
        Arc::new(RuntimeConfig {
            endpoint: Endpoint::Tcp("127.0.0.1:0".into()),
            region: "ap-guangzhou".into(),
            zone: "ap-guangzhou-3".into(),
            node_id: Some("ins-1".into()),
            cbs_url: "cbs.internal.tencentcloudapi.com".into(),
            cluster_id: "cls-abc".into(),
            role,
            volume_attach_limit: VolumeAttachLimit::default(),
            enable_metrics_server: metrics,
            metric_port: 0,
            tag_sync_interval: TagSyncInterval::default(),
            cluster_client: ClusterClientSource::InCluster,
        })
    }

    struct NopReconciler;

    #[async_trait]
    impl TagReconciler for NopReconciler {
        fn name(&self) -> &'static str {
            "nop"
        }
        async fn reconcile(&self, _: &TagSyncRequest) -> Result<(), ReconcileError> {
            Ok(())
        }
    }

    struct FakeController {
        fail_load: bool,
        loads: AtomicUsize,
    }

    #[async_trait]
    impl ControllerService for FakeController {
        async fn load_persisted_state(&self) -> Result<(), ServiceError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_load {
                return Err(ServiceError::StateLoad {
                    location: "/var/lib/csi-cbs/metadata.json".into(),
                    reason: "corrupt".into(),
                });
            }
            Ok(())
        }

        fn tag_reconciler(&self) -> Arc<dyn TagReconciler> {
            Arc::new(NopReconciler)
        }
    }

    struct FakeNode;

    impl NodeService for FakeNode {
        fn node_id(&self) -> &str {
            "ins-1"
        }
        fn zone(&self) -> &str {
            "ap-guangzhou-3"
        }
        fn max_volumes_per_node(&self) -> i64 {
            20
        }
    }

    #[derive(Default)]
    struct FakeRpc {
        served: Mutex<Vec<ComponentRole>>,
    }

    #[async_trait]
    impl RpcServer for FakeRpc {
        async fn serve(
            &self,
            _endpoint: &Endpoint,
            service: RoleService,
            _shutdown: CancellationToken,
        ) -> Result<(), RpcError> {
            self.served.lock().unwrap().push(service.role());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeExporter {
        builds: AtomicUsize,
    }

    impl BackgroundService for FakeExporter {
        fn name(&self) -> &'static str {
            "fake-exporter"
        }

        fn build(&self, shutdown: CancellationToken) -> (TaskRef, ServiceSpec) {
            self.builds.fetch_add(1, Ordering::SeqCst);
            let task: TaskRef = TaskFn::arc("fake-exporter", move |_ctx: CancellationToken| {
                let shutdown = shutdown.clone();
                async move {
                    shutdown.cancelled().await;
                    Ok::<(), TaskError>(())
                }
            });
            (task, ServiceSpec::perpetual("fake-exporter", 5_000))
        }
    }

    fn controller(fail_load: bool) -> Arc<FakeController> {
        Arc::new(FakeController {
            fail_load,
            loads: AtomicUsize::new(0),
        })
    }

    #[test]
    fn rejects_service_of_other_role() {
        let res = Driver::new(
            config(ComponentRole::Controller, false),
            RoleService::Node(Arc::new(FakeNode)),
        );
        assert!(matches!(
            res,
            Err(CoreError::RoleMismatch {
                configured: ComponentRole::Controller,
                service: ComponentRole::Node,
            })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn state_load_failure_starts_nothing() {
        let ctrl = controller(true);
        let exporter = Arc::new(FakeExporter::default());
        let rpc = FakeRpc::default();

        let driver = Driver::new(
            config(ComponentRole::Controller, true),
            RoleService::Controller(ctrl.clone()),
        )
        .unwrap();
        let opts = RunOptions {
            metrics_exporter: Some(exporter.clone()),
            ..RunOptions::default()
        };

        let err = driver
            .run(opts, &rpc, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::StateLoad(_)));
        assert_eq!(exporter.builds.load(Ordering::SeqCst), 0);
        assert!(rpc.served.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn controller_loads_state_then_serves() {
        let ctrl = controller(false);
        let exporter = Arc::new(FakeExporter::default());
        let rpc = FakeRpc::default();
        let shutdown = CancellationToken::new();

        let driver = Driver::new(
            config(ComponentRole::Controller, true),
            RoleService::Controller(ctrl.clone()),
        )
        .unwrap();
        let opts = RunOptions {
            metrics_exporter: Some(exporter.clone()),
            tag_sync_seed: Some(1),
            ..RunOptions::default()
        };

        driver.run(opts, &rpc, shutdown.clone()).await.unwrap();

        assert_eq!(ctrl.loads.load(Ordering::SeqCst), 1);
        assert_eq!(exporter.builds.load(Ordering::SeqCst), 1);
        assert_eq!(*rpc.served.lock().unwrap(), vec![ComponentRole::Controller]);
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn node_skips_exporter_when_metrics_disabled() {
        let exporter = Arc::new(FakeExporter::default());
        let rpc = FakeRpc::default();

        let driver = Driver::new(
            config(ComponentRole::Node, false),
            RoleService::Node(Arc::new(FakeNode)),
        )
        .unwrap();
        let opts = RunOptions {
            metrics_exporter: Some(exporter.clone()),
            ..RunOptions::default()
        };

        driver
            .run(opts, &rpc, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(exporter.builds.load(Ordering::SeqCst), 0);
        assert_eq!(*rpc.served.lock().unwrap(), vec![ComponentRole::Node]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rpc_failure_is_reported_and_cancels_shutdown() {
        struct BrokenRpc;

        #[async_trait]
        impl RpcServer for BrokenRpc {
            async fn serve(
                &self,
                endpoint: &Endpoint,
                _service: RoleService,
                _shutdown: CancellationToken,
            ) -> Result<(), RpcError> {
                Err(RpcError::Bind {
                    endpoint: endpoint.to_string(),
                    reason: "address in use".into(),
                })
            }
        }

        let shutdown = CancellationToken::new();
        let driver = Driver::new(
            config(ComponentRole::Node, false),
            RoleService::Node(Arc::new(FakeNode)),
        )
        .unwrap();

        let err = driver
            .run(RunOptions::default(), &BrokenRpc, shutdown.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Rpc(RpcError::Bind { .. })));
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_tag_sync_keeps_running_while_serving() {
        #[derive(Default)]
        struct FailingReconciler {
            passes: AtomicUsize,
        }

        #[async_trait]
        impl TagReconciler for FailingReconciler {
            fn name(&self) -> &'static str {
                "failing"
            }
            async fn reconcile(&self, _: &TagSyncRequest) -> Result<(), ReconcileError> {
                self.passes.fetch_add(1, Ordering::SeqCst);
                Err(ReconcileError::Failed("cloud api unavailable".into()))
            }
        }

        struct Controller(Arc<FailingReconciler>);

        #[async_trait]
        impl ControllerService for Controller {
            async fn load_persisted_state(&self) -> Result<(), ServiceError> {
                Ok(())
            }
            fn tag_reconciler(&self) -> Arc<dyn TagReconciler> {
                self.0.clone()
            }
        }

        // serves for ten simulated hours, then stops on its own
        struct TenHourRpc;

        #[async_trait]
        impl RpcServer for TenHourRpc {
            async fn serve(
                &self,
                _endpoint: &Endpoint,
                _service: RoleService,
                shutdown: CancellationToken,
            ) -> Result<(), RpcError> {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = tokio::time::sleep(Duration::from_secs(600 * 60)) => {}
                }
                Ok(())
            }
        }

        let reconciler = Arc::new(FailingReconciler::default());
        let driver = Driver::new(
            config(ComponentRole::Controller, false),
            RoleService::Controller(Arc::new(Controller(reconciler.clone()))),
        )
        .unwrap();
        let opts = RunOptions {
            tag_sync_seed: Some(3),
            ..RunOptions::default()
        };

        driver
            .run(opts, &TenHourRpc, CancellationToken::new())
            .await
            .unwrap();

        // every gap is drawn below the 60 minute interval
        let passes = reconciler.passes.load(Ordering::SeqCst);
        assert!((8..=40).contains(&passes), "unexpected number of passes: {passes}");
    }
}
