//! HTTP client for the remote publication search service.
//!
//! Sends exactly one call per submission and returns the raw body text.
//! Interpretation of the body belongs to [`crate::normalize`]. No retries:
//! every failure is final for that submission.

use crate::config::SearchConfig;
use crate::error::{PubSearchError, Result};
use crate::query::OutboundRequest;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Content type for the uploaded batch file
const BATCH_MIME: &str = "text/csv";

/// Something that can carry out an [`OutboundRequest`].
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Perform the call, returning the 2xx response body.
    async fn execute(&self, request: &OutboundRequest) -> Result<String>;
}

/// reqwest-backed search client
pub struct SearchClient {
    client: reqwest::Client,
    config: Arc<SearchConfig>,
}

impl SearchClient {
    /// Create a new SearchClient
    pub fn new(config: Arc<SearchConfig>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rustpubsearch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PubSearchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn execute(&self, request: &OutboundRequest) -> Result<String> {
        let builder = match request {
            OutboundRequest::Structured { url } => {
                info!(url = %url, "Sending structured search");
                self.client.get(url.clone())
            }
            OutboundRequest::Batch { url, fields, file } => {
                info!(url = %url, file = %file.name, bytes = file.content.len(), "Sending batch search");
                let part = Part::bytes(file.content.clone())
                    .file_name(file.name.clone())
                    .mime_str(BATCH_MIME)?;
                let form = fields
                    .iter()
                    .fold(Form::new().part("file", part), |form, (name, value)| {
                        form.text(*name, value.clone())
                    });
                self.client.post(url.clone()).multipart(form)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Search service rejected request");
            return Err(PubSearchError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "Search response received");
        Ok(body)
    }
}
