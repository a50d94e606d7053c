use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use cbs_model::MetadataKey;

use super::{MetadataError, MetadataSource};

/// Default timeout of a single metadata request.
pub const METADATA_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Metadata source backed by the instance metadata HTTP service.
///
/// Facts are plain-text documents under `<base_url>/<key path>`,
/// e.g. `http://metadata.tencentyun.com/latest/meta-data/placement/zone`.
#[derive(Debug, Clone)]
pub struct HttpMetadataSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetadataSource {
    /// Create a source for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(METADATA_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MetadataError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of a given fact.
    pub fn url_for(&self, key: MetadataKey) -> String {
        format!("{}/{}", self.base_url, key.path())
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataSource {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, key: MetadataKey) -> Result<String, MetadataError> {
        let url = self.url_for(key);
        debug!(%url, "querying metadata service");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                path: key.path(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?;
        let value = body.trim();
        if value.is_empty() {
            return Err(MetadataError::Empty(key.path()));
        }
        Ok(value.to_string())
    }
}
