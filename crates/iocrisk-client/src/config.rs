//! Service endpoint configuration.

use std::str::FromStr;
use std::time::Duration;

use iocrisk_core::DEFAULT_REQUEST_TIMEOUT;
use tracing::warn;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Which assessment route to POST to. Both take and return the same shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoint {
    #[default]
    Assess,
    Enrich,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Assess => "/api/assess",
            Self::Enrich => "/api/enrich",
        }
    }
}

impl FromStr for Endpoint {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assess" => Ok(Self::Assess),
            "enrich" => Ok(Self::Enrich),
            other => Err(ClientError::InvalidConfig(format!(
                "unknown endpoint '{}', expected 'assess' or 'enrich'",
                other
            ))),
        }
    }
}

/// Connection settings for [`AssessClient`](crate::AssessClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root, without a trailing slash.
    pub base_url: String,
    pub endpoint: Endpoint,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: std::env::var("IOCRISK_API_URL")
                .map(|url| trim_base(&url))
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            endpoint: endpoint_from_env(std::env::var("IOCRISK_ENDPOINT").ok().as_deref()),
            timeout: timeout_from_env(std::env::var("IOCRISK_TIMEOUT_SECS").ok().as_deref()),
            user_agent: format!("iocrisk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Config from `IOCRISK_*` environment variables, with defaults.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config for a specific service root.
    pub fn new(base_url: &str) -> Self {
        ClientConfig {
            base_url: trim_base(base_url),
            endpoint: Endpoint::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: format!("iocrisk/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn assess_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint.path())
    }

    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.base_url)
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Parse `IOCRISK_ENDPOINT`, warning and using the default on a bad value.
fn endpoint_from_env(value: Option<&str>) -> Endpoint {
    let Some(value) = value else {
        return Endpoint::default();
    };
    value.parse().unwrap_or_else(|e: ClientError| {
        warn!(var = "IOCRISK_ENDPOINT", value, error = %e, "ignoring invalid setting");
        Endpoint::default()
    })
}

/// Parse `IOCRISK_TIMEOUT_SECS`; zero and non-numeric values warn and fall back.
fn timeout_from_env(value: Option<&str>) -> Duration {
    let Some(value) = value else {
        return DEFAULT_REQUEST_TIMEOUT;
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!(
                var = "IOCRISK_TIMEOUT_SECS",
                value,
                default_secs = DEFAULT_REQUEST_TIMEOUT.as_secs(),
                "ignoring invalid setting"
            );
            DEFAULT_REQUEST_TIMEOUT
        }
    }
}
