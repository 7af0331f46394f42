//! Remote assessment service abstraction.
//!
//! The session only talks to the service through [`AnalysisService`]; the
//! HTTP implementation lives in `iocrisk-client` and in-memory fakes in
//! [`crate::fakes`].

use async_trait::async_trait;

use crate::domain::{AssessRequest, AssessResponse, HealthStatus, TransportError};

/// Result type for remote calls.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// The opaque enrichment endpoint.
///
/// Guarantees expected from implementations:
/// - non-2xx responses map to [`TransportError::Status`]
/// - a body without `results` decodes to an empty result list
/// - no retries; one call is one request
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Submit indicators for assessment.
    async fn assess(&self, request: &AssessRequest) -> TransportResult<AssessResponse>;

    /// Probe service health.
    async fn health(&self) -> TransportResult<HealthStatus>;
}

#[async_trait]
impl<S: AnalysisService + ?Sized> AnalysisService for std::sync::Arc<S> {
    async fn assess(&self, request: &AssessRequest) -> TransportResult<AssessResponse> {
        (**self).assess(request).await
    }

    async fn health(&self) -> TransportResult<HealthStatus> {
        (**self).health().await
    }
}
