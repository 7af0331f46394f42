//! Input parsing and validation for free-text indicator lists.
//!
//! Input is one indicator per line. Validation runs on every input change
//! and never echoes the raw line content back: messages carry only counts
//! and line numbers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sanitize::sanitize;

/// Maximum number of indicators per submission.
pub const MAX_INDICATORS: usize = 10;

static RE_TOKEN_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s]+").expect("valid separator regex"));

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// More than [`MAX_INDICATORS`] non-blank lines.
    Limit,
    /// A line holds more than one token.
    MultipleValuesOnLine,
}

impl IssueKind {
    /// Whether an issue of this kind blocks submission.
    pub fn blocks_submission(self) -> bool {
        matches!(self, Self::Limit | Self::MultipleValuesOnLine)
    }
}

/// A single problem detected in the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// 1-based position among the non-blank lines, for per-line issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    /// Line count for `Limit`, token count for `MultipleValuesOnLine`.
    pub offending_count: usize,
    pub message: String,
}

impl ValidationIssue {
    fn limit(count: usize) -> Self {
        Self {
            kind: IssueKind::Limit,
            line_number: None,
            offending_count: count,
            message: sanitize(&format!(
                "Too many IOCs ({}/{} max)",
                count, MAX_INDICATORS
            )),
        }
    }

    fn multiple_values(line_number: usize, tokens: usize) -> Self {
        Self {
            kind: IssueKind::MultipleValuesOnLine,
            line_number: Some(line_number),
            offending_count: tokens,
            message: sanitize(&format!(
                "Line {}: Multiple values detected ({} items)",
                line_number, tokens
            )),
        }
    }
}

/// Split raw text into trimmed, non-empty lines, in order.
pub fn parse_indicators(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Detect limit and per-line violations.
///
/// Blank or whitespace-only input yields no issues; emptiness is a
/// submission-gate concern, not a validation issue.
pub fn validate_input(text: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if text.trim().is_empty() {
        return issues;
    }

    let lines: Vec<(usize, &str)> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .collect();

    if lines.len() > MAX_INDICATORS {
        issues.push(ValidationIssue::limit(lines.len()));
    }

    for (line_number, line) in lines {
        if !line.contains([',', ' ', '\t']) {
            continue;
        }
        let tokens = RE_TOKEN_SEPARATOR
            .split(line)
            .filter(|token| !token.is_empty())
            .count();
        if tokens > 1 {
            issues.push(ValidationIssue::multiple_values(line_number, tokens));
        }
    }

    issues
}

/// Whether any issue blocks submission.
pub fn has_blocking_issues(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|issue| issue.kind.blocks_submission())
}
