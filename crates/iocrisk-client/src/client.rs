//! reqwest-backed [`AnalysisService`].

use async_trait::async_trait;
use iocrisk_core::{AnalysisService, AssessRequest, AssessResponse, HealthStatus, TransportResult};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Client for the assessment service.
///
/// One call is one HTTP request: no retries, no caching.
pub struct AssessClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl AssessClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(AssessClient {
            config,
            http_client,
        })
    }

    /// Create client from `IOCRISK_*` environment variables
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST the indicator list and decode the envelope.
    pub async fn post_assess(
        &self,
        request: &AssessRequest,
    ) -> Result<AssessResponse, ClientError> {
        let url = self.config.assess_url();
        debug!(url = %url, iocs = request.iocs.len(), "posting assessment request");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.decode(response).await
    }

    /// GET the health probe.
    pub async fn get_health(&self) -> Result<HealthStatus, ClientError> {
        let url = self.config.health_url();
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            // body is for the log only
            warn!(
                status = status.as_u16(),
                body = %truncate(&body, 512),
                "service returned error status"
            );
            return Err(ClientError::Status(status.as_u16()));
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.timeout.as_secs())
        } else {
            ClientError::from(err)
        }
    }
}

#[async_trait]
impl AnalysisService for AssessClient {
    async fn assess(&self, request: &AssessRequest) -> TransportResult<AssessResponse> {
        Ok(self.post_assess(request).await?)
    }

    async fn health(&self) -> TransportResult<HealthStatus> {
        Ok(self.get_health().await?)
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
