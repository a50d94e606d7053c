mod cli;
mod cluster;
mod services;
mod store;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use taskvisor::Subscribe;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use cbs_api::{CsiGrpcServer, MetricsServer};
use cbs_core::{
    BackgroundService, ConfigResolver, Driver, HttpMetadataSource, MetadataSource, MetricsHandle,
    RunOptions,
};
use cbs_exec::{CommandTagReconciler, ReconcileCommand};
use cbs_model::{ClusterClientSource, ConfigInput, Env, RuntimeConfig};
use cbs_observe::{LoggerConfig, LoggerLevel, ServiceEventLogger, init_logger};
use cbs_prometheus::PrometheusMetrics;

use crate::{cli::Args, store::FileCacheStore};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1) logger
    let cfg = LoggerConfig {
        format: args.log_format.parse()?,
        level: LoggerLevel::new(args.log_level.as_str())?,
        ..Default::default()
    };
    init_logger(&cfg)?;
    info!(version = env!("CARGO_PKG_VERSION"), "cbs-csi starting");

    if let Err(e) = run(args).await {
        error!(error = %format_args!("{e:#}"), "driver exited with error");
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    // 2) configuration
    let env = Env::from_process();
    let metrics = Arc::new(PrometheusMetrics::new().context("failed to register metrics")?);
    let source = HttpMetadataSource::new(args.metadata_url.as_str())
        .context("failed to build metadata client")?;

    let config = Arc::new(
        resolve_config(&args.config_input(), env, Arc::new(source), metrics.clone()).await?,
    );
    info!(%config, "configuration resolved");

    // 3) role service
    let reconciler = match ReconcileCommand::parse(&args.tag_sync_command) {
        Some(cmd) => CommandTagReconciler::new(cmd, services::reconciler_env(&config, &args.kubeconfig))
            .context("invalid --tag_sync_command")?,
        None => CommandTagReconciler::disabled(),
    };
    let service = services::build_role_service(
        &config,
        FileCacheStore::new(args.metadata_store.as_str()),
        reconciler,
    );

    // 4) shutdown on Ctrl-C / SIGTERM
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    // 5) run until the rpc server stops
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ServiceEventLogger)];
    let exporter: Arc<dyn BackgroundService> =
        Arc::new(MetricsServer::new(config.metric_port, metrics.clone()));
    let opts = RunOptions {
        subscribers,
        metrics_exporter: Some(exporter),
        ..Default::default()
    };

    Driver::new(Arc::clone(&config), service)?
        .with_metrics(metrics)
        .run(opts, &CsiGrpcServer, shutdown)
        .await?;
    info!("cbs-csi stopped");
    Ok(())
}

/// Check the cluster client settings, then resolve the runtime configuration.
///
/// An unusable cluster client fails startup before any metadata lookup.
async fn resolve_config(
    input: &ConfigInput,
    env: Env,
    source: Arc<dyn MetadataSource>,
    metrics: MetricsHandle,
) -> anyhow::Result<RuntimeConfig> {
    let cluster_client = ClusterClientSource::from_flags(&input.master, &input.kubeconfig);
    cluster::check_cluster_client(&cluster_client, &env)?;

    let resolver = ConfigResolver::new(source, env).with_metrics(metrics);
    Ok(resolver.resolve(input).await?)
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
        _ = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}
