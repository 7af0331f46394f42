//! HTTP transport for the IOC risk assessment service
//!
//! Implements [`iocrisk_core::AnalysisService`] over `POST /api/assess`
//! (or `/api/enrich`) and `GET /api/health`.

pub mod client;
pub mod config;
pub mod error;

pub use client::AssessClient;
pub use config::{ClientConfig, Endpoint, DEFAULT_BASE_URL};
pub use error::ClientError;
