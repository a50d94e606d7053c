use std::time::Duration;

use thiserror::Error;

use cbs_core::ReconcileError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid reconcile command: {0}")]
    InvalidCommand(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("command did not finish within {0:?}")]
    Timeout(Duration),

    #[error("command exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },
}

impl From<ExecError> for ReconcileError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::InvalidCommand(_) | ExecError::Io(_) => {
                ReconcileError::Unavailable(e.to_string())
            }
            ExecError::Timeout(_) | ExecError::NonZeroExit { .. } => {
                ReconcileError::Failed(e.to_string())
            }
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "signal".to_string(),
    }
}
