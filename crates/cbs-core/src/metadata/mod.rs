//! Instance metadata lookups.
//!
//! [`MetadataSource`] is the lowest-priority source of the resolver: it is queried only for
//! fields that neither the caller nor the environment supplied.
use async_trait::async_trait;
use thiserror::Error;

use cbs_model::MetadataKey;

#[cfg(feature = "metadata-http")]
mod http;
#[cfg(feature = "metadata-http")]
pub use http::HttpMetadataSource;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {status} for {path}")]
    Status { path: &'static str, status: u16 },

    #[error("empty value for {0}")]
    Empty(&'static str),
}

/// Source of runtime facts (region, zone, instance id).
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch one fact. Implementations return the trimmed value.
    async fn fetch(&self, key: MetadataKey) -> Result<String, MetadataError>;
}
