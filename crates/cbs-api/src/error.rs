use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to render metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
