use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use cbs_core::{ReconcileError, TagReconciler, TagSyncRequest};
use cbs_model::{ENV_CLUSTER_ID, Env};

use crate::{ENV_REGION, ExecError, ReconcileCommand};

/// Longest stderr excerpt kept in error messages.
const STDERR_EXCERPT_BYTES: usize = 2048;

/// [`TagReconciler`] that runs an external command per pass.
///
/// Without a command every pass is a logged no-op, so the scheduler still runs
/// (and is observable) on controllers that have no tagger installed.
#[derive(Debug, Clone)]
pub struct CommandTagReconciler {
    command: Option<ReconcileCommand>,
    base_env: Env,
}

impl CommandTagReconciler {
    /// Create a reconciler; `base_env` is passed to every run (cloud endpoint, cluster client).
    pub fn new(command: ReconcileCommand, base_env: Env) -> Result<Self, ExecError> {
        command.validate()?;
        command.trace_state();
        Ok(Self {
            command: Some(command),
            base_env,
        })
    }

    /// Reconciler with no command configured.
    pub fn disabled() -> Self {
        Self {
            command: None,
            base_env: Env::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.command.is_some()
    }

    async fn run(&self, cmd: &ReconcileCommand, req: &TagSyncRequest) -> Result<(), ExecError> {
        let env = self
            .base_env
            .clone()
            .with(ENV_CLUSTER_ID, req.cluster_id.as_str())
            .with(ENV_REGION, req.region.as_str());

        let mut command = Command::new(&cmd.command);
        command.args(&cmd.args);
        for kv in env.iter() {
            command.env(kv.key(), kv.value());
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn()?;
        let output = tokio::time::timeout(cmd.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::Timeout(cmd.timeout))??;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(command = %cmd.command, "{line}");
        }
        if output.status.success() {
            return Ok(());
        }
        Err(ExecError::NonZeroExit {
            code: output.status.code(),
            stderr: excerpt(&output.stderr),
        })
    }
}

#[async_trait]
impl TagReconciler for CommandTagReconciler {
    fn name(&self) -> &'static str {
        "command"
    }

    #[instrument(level = "debug", skip_all, fields(region = %req.region, cluster_id = %req.cluster_id))]
    async fn reconcile(&self, req: &TagSyncRequest) -> Result<(), ReconcileError> {
        let Some(cmd) = &self.command else {
            debug!("no reconcile command configured; skipping pass");
            return Ok(());
        };

        self.run(cmd, req).await.map_err(|e| {
            warn!(command = %cmd.command, error = %e, "reconcile command failed");
            ReconcileError::from(e)
        })
    }
}

/// Last part of `stderr`, trimmed, at most [`STDERR_EXCERPT_BYTES`] long.
fn excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_EXCERPT_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_EXCERPT_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
