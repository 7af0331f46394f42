//! Structured observability hooks for the submission lifecycle.
//!
//! This module provides:
//! - Submission-scoped tracing spans via [`submission_span`]
//! - Emission functions for key lifecycle events: start, success, failure,
//!   local rejection, dropped records and export writes
//!
//! Events carry an `event` field so they can be filtered in JSON log output.

use tracing::{info, warn};
use uuid::Uuid;

/// Span covering one remote call, tagged with its request id.
///
/// Attach it with `tracing::Instrument` so it stays valid across awaits:
///
/// ```ignore
/// service.assess(&request).instrument(submission_span(request_id)).await
/// ```
pub fn submission_span(request_id: Uuid) -> tracing::Span {
    tracing::info_span!("iocrisk.submission", request_id = %request_id)
}

/// Emit event: a submission passed the gate and is about to hit the network.
pub fn emit_submission_started(request_id: Uuid, indicator_count: usize) {
    info!(
        event = "submission.started",
        request_id = %request_id,
        indicator_count = indicator_count,
    );
}

/// Emit event: the service answered and the result list was stored.
pub fn emit_submission_succeeded(
    request_id: Uuid,
    duration_ms: u64,
    results: usize,
    dropped: usize,
) {
    info!(
        event = "submission.succeeded",
        request_id = %request_id,
        duration_ms = duration_ms,
        results = results,
        dropped = dropped,
    );
}

/// Emit event: the remote call failed. The detail only ever reaches the log.
pub fn emit_submission_failed(request_id: Uuid, duration_ms: u64, error: &dyn std::fmt::Display) {
    warn!(
        event = "submission.failed",
        request_id = %request_id,
        duration_ms = duration_ms,
        error = %error,
    );
}

/// Emit event: a submission was rejected locally before any network call.
pub fn emit_submission_rejected(reason: &dyn std::fmt::Display) {
    info!(event = "submission.rejected", reason = %reason);
}

/// Emit event: a malformed result record was dropped from rendering.
pub fn emit_record_dropped(index: usize, reason: &dyn std::fmt::Display) {
    warn!(event = "records.dropped", index = index, reason = %reason);
}

/// Emit event: an export document was written to disk.
pub fn emit_export_written(path: &std::path::Path, total_iocs: usize) {
    info!(
        event = "export.written",
        path = %path.display(),
        total_iocs = total_iocs,
    );
}
