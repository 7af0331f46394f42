//! IOC risk assessment core library
//!
//! Validates free-text indicator lists, drives submissions against an
//! assessment service and reshapes per-provider findings into uniform,
//! sanitized display and export models.

pub mod defang;
pub mod domain;
pub mod export;
pub mod extract;
pub mod fakes;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod risk;
pub mod sanitize;
pub mod service;
pub mod session;
pub mod sources;
pub mod telemetry;
pub mod validation;

pub use defang::defang;

pub use domain::{
    decode_result, decode_results, AnalysisResult, AssessRequest, AssessResponse, HealthStatus,
    MalformedRecord, ResponseStats, SourceRecord, SourceStatus, SubmitError, TransportError,
};

pub use export::{build_export, export_file_name, write_export_json, ExportDocument};
pub use extract::{extract, format_value, resolve_path, FieldRow};
pub use metrics::METRICS;
pub use normalize::{normalize, normalize_scoped, DisplayBody, DisplayRecord, FieldScope};
pub use risk::{classify, RiskBand, RiskClass};
pub use sanitize::sanitize;
pub use service::{AnalysisService, TransportResult};
pub use session::{
    AnalysisSession, ExpandedSet, Phase, SessionOptions, SessionState, Submission,
    DEFAULT_REQUEST_TIMEOUT, EMPTY_INPUT_MESSAGE, GENERIC_FAILURE_MESSAGE,
};
pub use sources::{provider_config, FieldConfig, ProviderConfig, ValueType, PROVIDERS};
pub use telemetry::init_tracing;
pub use validation::{
    has_blocking_issues, parse_indicators, validate_input, IssueKind, ValidationIssue,
    MAX_INDICATORS,
};

/// Crate version, stamped into exports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
