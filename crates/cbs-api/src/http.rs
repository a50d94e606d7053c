use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
};
use taskvisor::{TaskError, TaskFn, TaskRef};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use cbs_core::{BackgroundService, MetricsBackend};
use cbs_model::ServiceSpec;
use cbs_prometheus::PrometheusMetrics;

use crate::error::ApiError;

/// Slot name of the metrics exporter.
pub const METRICS_SERVICE_NAME: &str = "cbs-metrics-server";

/// Fixed delay between exporter restarts.
pub const METRICS_RESTART_DELAY_MS: u64 = 5_000;

/// Router exposing `GET /metrics`.
pub fn metrics_router(metrics: Arc<PrometheusMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
}

/// GET /metrics
async fn render_metrics(
    State(metrics): State<Arc<PrometheusMetrics>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = metrics.encode_text()?;
    Ok(([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

/// `/metrics` exporter run under the supervisor.
///
/// A failed bind (port taken, permission denied) fails the attempt; the supervisor retries
/// it every [`METRICS_RESTART_DELAY_MS`] without limit.
pub struct MetricsServer {
    addr: SocketAddr,
    metrics: Arc<PrometheusMetrics>,
}

impl MetricsServer {
    /// Listen on all interfaces at `port`.
    pub fn new(port: u16, metrics: Arc<PrometheusMetrics>) -> Self {
        Self::with_addr(SocketAddr::from(([0, 0, 0, 0], port)), metrics)
    }

    pub fn with_addr(addr: SocketAddr, metrics: Arc<PrometheusMetrics>) -> Self {
        Self { addr, metrics }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl BackgroundService for MetricsServer {
    fn name(&self) -> &'static str {
        METRICS_SERVICE_NAME
    }

    fn build(&self, shutdown: CancellationToken) -> (TaskRef, ServiceSpec) {
        let addr = self.addr;
        let metrics = Arc::clone(&self.metrics);

        let task: TaskRef = TaskFn::arc(METRICS_SERVICE_NAME, move |ctx: CancellationToken| {
            let metrics = Arc::clone(&metrics);
            let shutdown = shutdown.clone();
            async move { serve_once(addr, metrics, shutdown, ctx).await }
        });

        let spec = ServiceSpec::perpetual(METRICS_SERVICE_NAME, METRICS_RESTART_DELAY_MS);
        (task, spec)
    }
}

/// One exporter attempt: bind, serve until stopped.
async fn serve_once(
    addr: SocketAddr,
    metrics: Arc<PrometheusMetrics>,
    shutdown: CancellationToken,
    ctx: CancellationToken,
) -> Result<(), TaskError> {
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            metrics.record_service_failure(METRICS_SERVICE_NAME);
            error!(%addr, error = %e, "failed to listen for metrics");
            return Err(TaskError::Fail {
                reason: format!("bind {addr}: {e}"),
            });
        }
    };
    info!(%addr, "metrics server listening");

    let stop = {
        let shutdown = shutdown.clone();
        let ctx = ctx.clone();
        async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = ctx.cancelled() => {}
            }
        }
    };
    let res = axum::serve(listener, metrics_router(Arc::clone(&metrics)))
        .with_graceful_shutdown(stop)
        .await;

    match res {
        Ok(()) if shutdown.is_cancelled() => Ok(()),
        Ok(()) if ctx.is_cancelled() => Err(TaskError::Canceled),
        Ok(()) => {
            metrics.record_service_failure(METRICS_SERVICE_NAME);
            Err(TaskError::Fail {
                reason: "metrics server stopped unexpectedly".into(),
            })
        }
        Err(e) => {
            metrics.record_service_failure(METRICS_SERVICE_NAME);
            error!(%addr, error = %e, "metrics server failed");
            Err(TaskError::Fail {
                reason: format!("serve {addr}: {e}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use cbs_core::{Outcome, SupervisorApi};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn http_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req = format!("GET {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
        stream.write_all(req.as_bytes()).await.unwrap();

        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn router_serves_prometheus_text() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        metrics.record_tag_sync(Outcome::Success, 250);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, metrics_router(metrics)).await });

        let resp = http_get(addr, "/metrics").await;
        assert!(resp.starts_with("HTTP/1.1 200"), "unexpected response: {resp}");
        assert!(resp.contains("text/plain; version=0.0.4"));
        assert!(resp.contains(r#"cbs_tag_sync_total{outcome="success"} 1"#));

        let missing = http_get(addr, "/healthz").await;
        assert!(missing.starts_with("HTTP/1.1 404"), "unexpected response: {missing}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bind_failure_fails_the_attempt_and_is_counted() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let res = serve_once(
            addr,
            Arc::clone(&metrics),
            CancellationToken::new(),
            CancellationToken::new(),
        )
        .await;

        assert!(matches!(res, Err(TaskError::Fail { .. })));
        let text = metrics.encode_text().unwrap();
        assert!(
            text.contains(r#"cbs_service_failures_total{service="cbs-metrics-server"} 1"#),
            "{text}"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_ends_the_attempt_cleanly() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let shutdown = CancellationToken::new();

        let attempt = tokio::spawn(serve_once(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            metrics,
            shutdown.clone(),
            CancellationToken::new(),
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();

        let res = tokio::time::timeout(Duration::from_secs(5), attempt)
            .await
            .unwrap()
            .unwrap();
        assert!(res.is_ok());
    }

    fn exporter_failures(metrics: &PrometheusMetrics) -> u64 {
        let text = metrics.encode_text().unwrap();
        text.lines()
            .find_map(|l| {
                l.strip_prefix(r#"cbs_service_failures_total{service="cbs-metrics-server"} "#)
            })
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn supervised_exporter_retries_until_port_is_free() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let sup = SupervisorApi::new(Vec::new()).await.unwrap();
        let shutdown = CancellationToken::new();
        let (task, spec) =
            MetricsServer::with_addr(addr, Arc::clone(&metrics)).build(shutdown.clone());
        sup.start_service(task, &spec).await.unwrap();

        // first attempt fails at once, the retry comes five seconds later
        tokio::time::sleep(Duration::from_millis(6_500)).await;
        let failed = exporter_failures(&metrics);
        assert!(failed >= 2, "expected repeated bind failures, got {failed}");

        drop(taken);

        let mut resp = String::new();
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(250)).await;
            if TcpStream::connect(addr).await.is_ok() {
                resp = http_get(addr, "/metrics").await;
                break;
            }
        }
        assert!(resp.starts_with("HTTP/1.1 200"), "unexpected response: {resp:?}");
        assert!(resp.contains("cbs_service_failures_total"));

        shutdown.cancel();
    }

    #[test]
    fn exporter_restarts_every_five_seconds() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let server = MetricsServer::new(9099, metrics);
        assert_eq!(server.addr().port(), 9099);

        let (_task, spec) = server.build(CancellationToken::new());
        assert_eq!(spec.slot, METRICS_SERVICE_NAME);
        assert_eq!(spec.restart_delay_ms, 5_000);
    }
}
