use std::{fmt, time::Duration};

use tracing::trace;

use crate::ExecError;

/// Environment variable carrying the region of a reconciliation pass.
pub const ENV_REGION: &str = "REGION";

/// Default upper bound of a single pass.
pub const DEFAULT_RECONCILE_TIMEOUT: Duration = Duration::from_secs(600);

/// External program run once per reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileCommand {
    pub(crate) command: String,
    pub(crate) args: Vec<String>,
    pub(crate) timeout: Duration,
}

impl ReconcileCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            timeout: DEFAULT_RECONCILE_TIMEOUT,
        }
    }

    /// Parse a whitespace-separated command line (`program arg1 arg2`).
    ///
    /// Blank input means "no command configured".
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let command = parts.next()?;
        Some(Self::new(command).with_args(parts))
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn validate(&self) -> Result<(), ExecError> {
        if self.command.trim().is_empty() {
            return Err(ExecError::InvalidCommand("command is empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(ExecError::InvalidCommand("timeout must be positive".into()));
        }
        Ok(())
    }

    pub(crate) fn trace_state(&self) {
        trace!(
            command = %self.command,
            args = ?self.args,
            timeout_ms = self.timeout.as_millis() as u64,
            "reconcile command resolved"
        );
    }
}

impl fmt::Display for ReconcileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReconcileCommand(cmd='{}', args={}, timeout={:?})",
            self.command,
            self.args.len(),
            self.timeout,
        )
    }
}
