//! Domain models for iocrisk.
//!
//! - `AnalysisResult` / `SourceRecord`: what the assessment service returns
//! - `AssessRequest` / `AssessResponse` / `HealthStatus`: the wire envelope
//! - error taxonomy for local rejection, transport failure and bad records

pub mod error;
pub mod result;

pub use error::{MalformedRecord, SubmitError, TransportError};
pub use result::{
    decode_result, decode_results, AnalysisResult, AssessRequest, AssessResponse, HealthStatus,
    ResponseStats, SourceRecord, SourceStatus,
};
