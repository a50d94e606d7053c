//! High-level API over taskvisor `Supervisor` used by the driver.
//! - Owns a `Supervisor` instance.
//! - Submits background services via the controller with mapped policies.
use std::sync::Arc;

use taskvisor::{ControllerConfig, Subscribe, Supervisor, SupervisorConfig, TaskRef};
use tracing::{debug, error, info, instrument};

use crate::{error::CoreError, map::to_controller_spec};
use cbs_model::ServiceSpec;

/// Thin wrapper around taskvisor [`Supervisor`].
pub struct SupervisorApi {
    sup: Arc<Supervisor>,
}

impl SupervisorApi {
    /// Create a supervisor with explicit configs and start its run loop in background.
    pub async fn with_config(
        sup_cfg: SupervisorConfig,
        ctrl_cfg: ControllerConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, CoreError> {
        let sup = Supervisor::builder(sup_cfg)
            .with_subscribers(subscribers)
            .with_controller(ctrl_cfg)
            .build();

        let runner = Arc::clone(&sup);
        tokio::spawn(async move {
            if let Err(e) = runner.run(Vec::new()).await {
                error!(error = %e, "supervisor run loop exited with error");
            }
        });
        sup.wait_ready().await;
        info!("supervisor is ready to accept services");
        Ok(Self { sup })
    }

    /// Create a supervisor with default settings.
    pub async fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Result<Self, CoreError> {
        Self::with_config(
            SupervisorConfig::default(),
            ControllerConfig::default(),
            subscribers,
        )
        .await
    }

    /// Submit a background service built by the caller.
    #[instrument(level = "debug", skip(self, task, spec), fields(slot = %spec.slot))]
    pub async fn start_service(&self, task: TaskRef, spec: &ServiceSpec) -> Result<(), CoreError> {
        debug!("submitting via controller");
        self.sup
            .submit(to_controller_spec(task, spec))
            .await
            .map_err(|e| CoreError::Supervisor(e.to_string()))
    }
}
