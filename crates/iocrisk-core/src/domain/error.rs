//! Error taxonomy for the assessment pipeline.

/// Why a submission was refused before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("input has {count} blocking validation issue(s)")]
    Validation { count: usize },

    #[error("no indicators to submit")]
    EmptyInput,

    #[error("a submission is already in flight")]
    InFlight,
}

/// Failure of the remote assessment call.
///
/// The detail carried here is for logs only; sessions surface
/// [`GENERIC_FAILURE_MESSAGE`](crate::session::GENERIC_FAILURE_MESSAGE).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("service returned HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),

    #[error("response could not be decoded: {0}")]
    Decode(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),
}

/// Why a single result record was dropped from rendering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedRecord {
    #[error("record is not an object")]
    NotAnObject,

    #[error("field `{field}` has the wrong type")]
    FieldType { field: &'static str },

    #[error("risk score {0} is outside 0..=100")]
    ScoreOutOfRange(f64),
}
