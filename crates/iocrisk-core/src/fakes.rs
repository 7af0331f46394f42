//! In-memory fakes for [`AnalysisService`] (testing only)
//!
//! `ScriptedService` replays a queue of scripted outcomes and records every
//! request it receives, so tests can assert how many calls reached the
//! "network".

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::{AssessRequest, AssessResponse, HealthStatus, TransportError};
use crate::service::{AnalysisService, TransportResult};

/// One scripted outcome for a single `assess` call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with one well-formed result per submitted indicator.
    Echo { risk_score: u8 },
    /// Answer with this exact response.
    Respond(AssessResponse),
    /// Fail with this transport error.
    Fail(TransportError),
    /// Never answer.
    Hang,
}

/// Scripted in-memory assessment service.
///
/// When the script queue is exhausted every further call behaves like
/// `Script::Echo { risk_score: 0 }`.
#[derive(Debug, Default)]
pub struct ScriptedService {
    script: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<AssessRequest>>,
    health: Mutex<Option<TransportResult<HealthStatus>>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one outcome.
    pub fn then(self, step: Script) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub fn echoing(risk_score: u8) -> Self {
        Self::new().then(Script::Echo { risk_score })
    }

    pub fn failing(error: TransportError) -> Self {
        Self::new().then(Script::Fail(error))
    }

    pub fn responding(response: AssessResponse) -> Self {
        Self::new().then(Script::Respond(response))
    }

    pub fn hanging() -> Self {
        Self::new().then(Script::Hang)
    }

    /// Set the outcome of `health()`.
    pub fn with_health(self, health: TransportResult<HealthStatus>) -> Self {
        *self.health.lock().unwrap() = Some(health);
        self
    }

    /// Number of `assess` calls received.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copies of every received request, in order.
    pub fn requests(&self) -> Vec<AssessRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn assess(&self, request: &AssessRequest) -> TransportResult<AssessResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Echo { risk_score: 0 });

        match step {
            Script::Echo { risk_score } => Ok(AssessResponse {
                results: request
                    .iocs
                    .iter()
                    .map(|ioc| sample_result(ioc, risk_score))
                    .collect(),
                total_processed: Some(request.iocs.len() as u64),
                processing_time: Some(0.01),
            }),
            Script::Respond(response) => Ok(response),
            Script::Fail(error) => Err(error),
            Script::Hang => std::future::pending().await,
        }
    }

    async fn health(&self) -> TransportResult<HealthStatus> {
        self.health.lock().unwrap().clone().unwrap_or_else(|| {
            Ok(HealthStatus {
                status: "healthy".to_string(),
                timestamp: "2025-07-20T00:00:00".to_string(),
                version: "1.0.0".to_string(),
            })
        })
    }
}

/// A well-formed raw result record as the service would return it.
pub fn sample_result(ioc: &str, risk_score: u8) -> Value {
    json!({
        "ioc": ioc,
        "ioc_type": "ip",
        "risk_score": risk_score,
        "summary": format!("{} assessed by 2 sources", ioc),
        "sources": [
            {
                "source": "AbuseIPDB",
                "status": "success",
                "data": {
                    "abuseConfidenceScore": risk_score,
                    "totalReports": 12,
                    "countryCode": "US",
                    "isp": "Example ISP"
                }
            },
            {
                "source": "IPInfo",
                "status": "success",
                "data": {
                    "ip": ioc,
                    "city": "San Francisco",
                    "country": "US",
                    "org": "AS13335 Cloudflare, Inc."
                }
            }
        ],
        "timestamp": "2025-07-20T00:00:00"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(iocs: &[&str]) -> AssessRequest {
        AssessRequest {
            iocs: iocs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_echo_returns_one_result_per_indicator() {
        let service = ScriptedService::echoing(40);
        let response = service.assess(&request(&["1.1.1.1", "evil.com"])).await.unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[1]["ioc"], "evil.com");
        assert_eq!(response.results[0]["risk_score"], 40);
        assert_eq!(service.request_count(), 1);
    }

    #[tokio::test]
    async fn test_script_is_replayed_in_order() {
        let service = ScriptedService::failing(TransportError::Status(500))
            .then(Script::Respond(AssessResponse::default()));
        let req = request(&["1.1.1.1"]);

        assert_eq!(
            service.assess(&req).await.unwrap_err(),
            TransportError::Status(500)
        );
        assert!(service.assess(&req).await.unwrap().results.is_empty());
        // exhausted script falls back to echo
        assert_eq!(service.assess(&req).await.unwrap().results.len(), 1);
        assert_eq!(service.request_count(), 3);
    }

    #[tokio::test]
    async fn test_health_defaults_to_healthy() {
        let service = ScriptedService::new();
        assert_eq!(service.health().await.unwrap().status, "healthy");

        let service =
            ScriptedService::new().with_health(Err(TransportError::Request("refused".into())));
        assert!(service.health().await.is_err());
    }
}
