//! Analysis session: the single owner of submission state.
//!
//! The lifecycle is an explicit state machine:
//!
//! ```text
//! Idle ──begin──▶ Submitting ──complete──▶ Succeeded | Failed
//!   ▲                                          │
//!   └──────────── edits, toggles, clear ◀──────┘
//! ```
//!
//! Entering `Submitting` clears prior results, errors and expansion. While a
//! submission is outstanding a second one is rejected with
//! [`SubmitError::InFlight`], never queued. Every remote call is bounded by
//! [`SessionOptions::request_timeout`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::domain::{
    decode_results, AnalysisResult, AssessRequest, AssessResponse, HealthStatus, ResponseStats,
    SubmitError, TransportError,
};
use crate::metrics::METRICS;
use crate::normalize::falls_back;
use crate::obs;
use crate::sanitize::sanitize;
use crate::service::{AnalysisService, TransportResult};
use crate::validation::{has_blocking_issues, parse_indicators, validate_input, ValidationIssue};

/// Shown for every transport failure; the detail goes to the log only.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze IOCs. Please try again later.";

pub const VALIDATION_BLOCKED_MESSAGE: &str = "Please fix validation issues before submitting";

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter at least one IOC";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting { request_id: Uuid },
    Succeeded,
    Failed,
}

/// Indicators whose details are shown.
///
/// Immutable: [`ExpandedSet::toggled`] returns a new set and leaves the
/// receiver untouched, so clones held elsewhere never change underneath.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedSet(Arc<BTreeSet<String>>);

impl ExpandedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, indicator: &str) -> bool {
        self.0.contains(indicator)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// A copy with `indicator` added if absent, removed if present.
    pub fn toggled(&self, indicator: &str) -> Self {
        let mut next = (*self.0).clone();
        if !next.remove(indicator) {
            next.insert(indicator.to_string());
        }
        Self(Arc::new(next))
    }
}

/// Everything a front end needs to render one session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub input_text: String,
    pub phase: Phase,
    /// Stored exactly as decoded; reshaping happens at read time.
    pub results: Vec<AnalysisResult>,
    /// Sanitized, user-facing.
    pub error_message: Option<String>,
    pub validation_issues: Vec<ValidationIssue>,
    pub expanded: ExpandedSet,
    /// Malformed records dropped from the last response.
    pub dropped_records: usize,
    pub stats: Option<ResponseStats>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            input_text: String::new(),
            phase: Phase::Idle,
            results: Vec::new(),
            error_message: None,
            validation_issues: Vec::new(),
            expanded: ExpandedSet::new(),
            dropped_records: 0,
            stats: None,
        }
    }
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Submitting { .. })
    }

    /// Number of indicators the current input would submit.
    pub fn indicator_count(&self) -> usize {
        parse_indicators(&self.input_text).len()
    }

    /// The submission gate: not loading, no blocking issues, non-blank input.
    pub fn can_submit(&self) -> bool {
        !self.is_loading()
            && !has_blocking_issues(&self.validation_issues)
            && !self.input_text.trim().is_empty()
    }
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Upper bound on a single remote call.
    pub request_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Ticket for an outstanding submission, produced by
/// [`AnalysisSession::begin_submission`].
#[derive(Debug)]
pub struct Submission {
    request_id: Uuid,
    request: AssessRequest,
    started: Instant,
}

impl Submission {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn request(&self) -> &AssessRequest {
        &self.request
    }
}

/// Owns one [`SessionState`] and drives it against an [`AnalysisService`].
pub struct AnalysisSession<S> {
    service: S,
    options: SessionOptions,
    state: SessionState,
}

impl<S: AnalysisService> AnalysisSession<S> {
    pub fn new(service: S) -> Self {
        Self::with_options(service, SessionOptions::default())
    }

    pub fn with_options(service: S, options: SessionOptions) -> Self {
        Self {
            service,
            options,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Replace the input text and re-run validation synchronously.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input_text = text.into();
        self.state.validation_issues = validate_input(&self.state.input_text);
    }

    /// Flip the expansion of one indicator. Valid in every phase.
    pub fn toggle_expanded(&mut self, indicator: &str) {
        self.state.expanded = self.state.expanded.toggled(indicator);
    }

    /// Reset to the initial state in one step.
    ///
    /// An outstanding submission becomes stale and its completion is
    /// discarded.
    pub fn clear(&mut self) {
        self.state = SessionState::default();
    }

    /// Pass the submission gate and enter `Submitting`.
    ///
    /// Validation is re-run here regardless of what is cached on the state.
    pub fn begin_submission(&mut self) -> Result<Submission, SubmitError> {
        if self.state.is_loading() {
            obs::emit_submission_rejected(&SubmitError::InFlight);
            return Err(SubmitError::InFlight);
        }

        let issues = validate_input(&self.state.input_text);
        self.state.validation_issues = issues;
        if has_blocking_issues(&self.state.validation_issues) {
            let err = SubmitError::Validation {
                count: self
                    .state
                    .validation_issues
                    .iter()
                    .filter(|issue| issue.kind.blocks_submission())
                    .count(),
            };
            self.state.error_message = Some(sanitize(VALIDATION_BLOCKED_MESSAGE));
            obs::emit_submission_rejected(&err);
            return Err(err);
        }

        let iocs = parse_indicators(&self.state.input_text);
        if iocs.is_empty() {
            self.state.error_message = Some(sanitize(EMPTY_INPUT_MESSAGE));
            obs::emit_submission_rejected(&SubmitError::EmptyInput);
            return Err(SubmitError::EmptyInput);
        }

        let request_id = Uuid::new_v4();
        self.state.results.clear();
        self.state.error_message = None;
        self.state.expanded = ExpandedSet::new();
        self.state.dropped_records = 0;
        self.state.stats = None;
        self.state.phase = Phase::Submitting { request_id };

        METRICS.inc_submissions_started();
        obs::emit_submission_started(request_id, iocs.len());

        Ok(Submission {
            request_id,
            request: AssessRequest { iocs },
            started: Instant::now(),
        })
    }

    /// Perform the bounded remote call for a submission.
    pub async fn dispatch(&self, submission: &Submission) -> TransportResult<AssessResponse> {
        let limit = self.options.request_timeout;
        let call = self
            .service
            .assess(&submission.request)
            .instrument(obs::submission_span(submission.request_id));

        match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout(limit.as_secs())),
        }
    }

    /// Store the outcome of a submission.
    ///
    /// Returns `false` when the submission is stale (the session was cleared
    /// or moved on) and the outcome was discarded.
    pub fn complete_submission(
        &mut self,
        submission: Submission,
        outcome: TransportResult<AssessResponse>,
    ) -> bool {
        match self.state.phase {
            Phase::Submitting { request_id } if request_id == submission.request_id => {}
            _ => {
                debug!(request_id = %submission.request_id, "discarding stale completion");
                return false;
            }
        }

        let duration_ms = submission.started.elapsed().as_millis() as u64;
        match outcome {
            Ok(response) => {
                let (results, dropped) = decode_results(&response.results);
                METRICS.add_records_dropped(dropped as u64);
                METRICS.add_source_fallbacks(count_fallbacks(&results));
                obs::emit_submission_succeeded(
                    submission.request_id,
                    duration_ms,
                    results.len(),
                    dropped,
                );
                let stats = response.stats();
                debug!(
                    total_processed = ?stats.total_processed,
                    processing_time = ?stats.processing_time,
                    "response stats"
                );
                self.state.results = results;
                self.state.dropped_records = dropped;
                self.state.stats = Some(stats);
                self.state.phase = Phase::Succeeded;
            }
            Err(err) => {
                METRICS.inc_submissions_failed();
                obs::emit_submission_failed(submission.request_id, duration_ms, &err);
                self.state.results.clear();
                self.state.error_message = Some(sanitize(GENERIC_FAILURE_MESSAGE));
                self.state.phase = Phase::Failed;
            }
        }
        true
    }

    /// Gate, call and store in one step.
    pub async fn submit(&mut self) -> Result<&SessionState, SubmitError> {
        let submission = self.begin_submission()?;
        let outcome = self.dispatch(&submission).await;
        self.complete_submission(submission, outcome);
        Ok(&self.state)
    }

    /// Probe the service, bounded like a submission.
    pub async fn health(&self) -> TransportResult<HealthStatus> {
        let limit = self.options.request_timeout;
        match tokio::time::timeout(limit, self.service.health()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout(limit.as_secs())),
        }
    }
}

/// Source records across `results` that render in the fallback shape.
fn count_fallbacks(results: &[AnalysisResult]) -> u64 {
    results
        .iter()
        .flat_map(|result| &result.sources)
        .filter(|record| falls_back(record))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedService;
    use crate::validation::IssueKind;

    fn session() -> AnalysisSession<ScriptedService> {
        AnalysisSession::new(ScriptedService::echoing(20))
    }

    #[test]
    fn test_initial_state_is_idle_and_empty() {
        let s = session();
        let state = s.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.results.is_empty());
        assert!(state.error_message.is_none());
        assert!(state.expanded.is_empty());
        assert!(!state.can_submit());
    }

    #[test]
    fn test_set_input_revalidates() {
        let mut s = session();
        s.set_input("1.1.1.1, evil.com");
        assert_eq!(s.state().validation_issues.len(), 1);
        assert_eq!(
            s.state().validation_issues[0].kind,
            IssueKind::MultipleValuesOnLine
        );
        assert!(!s.state().can_submit());

        s.set_input("1.1.1.1\nevil.com");
        assert!(s.state().validation_issues.is_empty());
        assert!(s.state().can_submit());
        assert_eq!(s.state().indicator_count(), 2);
    }

    #[test]
    fn test_second_begin_while_in_flight_is_rejected() {
        let mut s = session();
        s.set_input("8.8.8.8");
        let first = s.begin_submission().unwrap();
        assert!(s.state().is_loading());
        assert!(!s.state().can_submit());

        assert_eq!(s.begin_submission().unwrap_err(), SubmitError::InFlight);
        assert_eq!(
            s.state().phase,
            Phase::Submitting {
                request_id: first.request_id()
            }
        );
    }

    #[test]
    fn test_begin_revalidates_stale_state() {
        let mut s = session();
        s.set_input("8.8.8.8");
        // bypass set_input so the cached issues are stale
        s.state.input_text = "a b".to_string();
        let err = s.begin_submission().unwrap_err();
        assert_eq!(err, SubmitError::Validation { count: 1 });
        assert_eq!(
            s.state().error_message.as_deref(),
            Some(VALIDATION_BLOCKED_MESSAGE)
        );
        assert_eq!(s.state().phase, Phase::Idle);
    }

    #[test]
    fn test_blank_input_is_rejected() {
        let mut s = session();
        s.set_input("  \n\t ");
        assert_eq!(s.begin_submission().unwrap_err(), SubmitError::EmptyInput);
        assert_eq!(s.state().error_message.as_deref(), Some(EMPTY_INPUT_MESSAGE));
    }

    #[test]
    fn test_begin_clears_previous_outcome() {
        let mut s = session();
        s.set_input("8.8.8.8");
        s.state.error_message = Some("old".into());
        s.toggle_expanded("8.8.8.8");
        s.state.dropped_records = 4;

        s.begin_submission().unwrap();
        assert!(s.state().error_message.is_none());
        assert!(s.state().expanded.is_empty());
        assert_eq!(s.state().dropped_records, 0);
    }

    #[test]
    fn test_stale_completion_is_discarded_after_clear() {
        let mut s = session();
        s.set_input("8.8.8.8");
        let submission = s.begin_submission().unwrap();
        s.clear();

        let applied = s.complete_submission(
            submission,
            Ok(AssessResponse {
                results: vec![crate::fakes::sample_result("8.8.8.8", 90)],
                ..Default::default()
            }),
        );
        assert!(!applied);
        assert_eq!(s.state().phase, Phase::Idle);
        assert!(s.state().results.is_empty());
    }

    #[test]
    fn test_failure_keeps_detail_out_of_state() {
        let mut s = session();
        s.set_input("8.8.8.8");
        let submission = s.begin_submission().unwrap();
        s.complete_submission(
            submission,
            Err(TransportError::Request(
                "connection refused: 10.0.0.5:8000".into(),
            )),
        );
        assert_eq!(s.state().phase, Phase::Failed);
        let message = s.state().error_message.as_deref().unwrap();
        assert_eq!(message, GENERIC_FAILURE_MESSAGE);
        assert!(!message.contains("10.0.0.5"));
    }

    #[test]
    fn test_toggle_is_copy_on_write() {
        let mut s = session();
        let before = s.state().expanded.clone();
        s.toggle_expanded("evil.com");
        assert!(s.state().expanded.contains("evil.com"));
        assert!(before.is_empty());

        let snapshot = s.state().expanded.clone();
        s.toggle_expanded("evil.com");
        assert!(!s.state().expanded.contains("evil.com"));
        assert!(snapshot.contains("evil.com"));
    }

    #[test]
    fn test_toggle_order_independent() {
        let a = ExpandedSet::new().toggled("x").toggled("y");
        let b = ExpandedSet::new().toggled("y").toggled("x");
        assert_eq!(a, b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_toggle_valid_while_submitting() {
        let mut s = session();
        s.set_input("8.8.8.8");
        let _submission = s.begin_submission().unwrap();
        s.toggle_expanded("8.8.8.8");
        assert!(s.state().expanded.contains("8.8.8.8"));
        assert!(s.state().is_loading());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut s = session();
        s.set_input("a b");
        s.toggle_expanded("a");
        s.clear();
        let state = s.state();
        assert!(state.input_text.is_empty());
        assert!(state.validation_issues.is_empty());
        assert!(state.expanded.is_empty());
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_fallbacks_counted_per_decoded_record() {
        let (results, _) = crate::domain::decode_results(&[
            crate::fakes::sample_result("8.8.8.8", 10),
            serde_json::json!({
                "ioc": "evil.com",
                "ioc_type": "domain",
                "risk_score": 50,
                "sources": [
                    {"source": "VirusTotal", "status": "error", "error": "quota"},
                    {"source": "Shodan", "status": "success", "data": {}},
                    {"source": "IPInfo", "status": "success", "data": {"ip": "1.2.3.4"}}
                ]
            }),
        ]);
        assert_eq!(count_fallbacks(&results), 2);

        // normalizing for display and export does not change the tally
        for result in &results {
            crate::normalize::normalize(&result.sources);
            crate::export::build_export(std::slice::from_ref(result), chrono::Utc::now());
        }
        assert_eq!(count_fallbacks(&results), 2);
    }
}
