use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown component type: {0} (expected: controller|node)")]
    UnknownRole(String),

    #[error("invalid endpoint: {0} (expected: unix://<path>|tcp://<host:port>)")]
    InvalidEndpoint(String),

    #[error("invalid tag sync interval: {0} minutes (must be positive)")]
    InvalidInterval(i64),
}

pub type ModelResult<T> = Result<T, ModelError>;
