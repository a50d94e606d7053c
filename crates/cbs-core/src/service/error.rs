use thiserror::Error;

/// Failure of a single reconciliation pass. Never fatal for the scheduler.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("reconciler unavailable: {0}")]
    Unavailable(String),

    #[error("reconciliation failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to load state from {location}: {reason}")]
    StateLoad { location: String, reason: String },

    #[error("internal service error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to bind {endpoint}: {reason}")]
    Bind { endpoint: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),
}
