//! Maps raw per-provider source records to a uniform display model.

use serde::Serialize;

use crate::domain::{SourceRecord, SourceStatus};
use crate::extract::{extract, FieldRow};
use crate::sanitize::sanitize;
use crate::sources::{provider_config, FieldConfig};

/// Which configured fields participate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    /// Every configured field.
    Display,
    /// Only fields marked exportable.
    Export,
}

impl FieldScope {
    fn includes(self, field: &FieldConfig) -> bool {
        match self {
            Self::Display => true,
            Self::Export => field.export,
        }
    }
}

/// Normalized view of one source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    pub source_name: String,
    pub status: SourceStatus,
    pub body: DisplayBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayBody {
    /// Rows extracted through the provider's field table.
    Fields { rows: Vec<FieldRow> },
    /// Minimal record: no table, non-success status or no payload.
    Fallback {
        /// Provider-reported error, sanitized.
        error_message: Option<String>,
        /// Human-readable explanation, sanitized.
        note: String,
    },
}

impl DisplayRecord {
    pub fn rows(&self) -> &[FieldRow] {
        match &self.body {
            DisplayBody::Fields { rows } => rows,
            DisplayBody::Fallback { .. } => &[],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.body, DisplayBody::Fallback { .. })
    }
}

/// Whether `record` renders as the minimal fallback shape: no field table
/// for its provider, a non-success status or no payload.
pub fn falls_back(record: &SourceRecord) -> bool {
    provider_config(&record.source_name).is_none()
        || !record.status.is_success()
        || record.data.is_none()
}

/// Normalize for display, keeping input order.
pub fn normalize(sources: &[SourceRecord]) -> Vec<DisplayRecord> {
    normalize_scoped(sources, FieldScope::Display)
}

/// Normalize with a chosen field scope, keeping input order.
pub fn normalize_scoped(sources: &[SourceRecord], scope: FieldScope) -> Vec<DisplayRecord> {
    sources
        .iter()
        .enumerate()
        .map(|(index, record)| normalize_record(index, record, scope))
        .collect()
}

fn normalize_record(index: usize, record: &SourceRecord, scope: FieldScope) -> DisplayRecord {
    let source_name = if record.source_name.trim().is_empty() {
        format!("Source {}", index + 1)
    } else {
        sanitize(&record.source_name)
    };

    let config = provider_config(&record.source_name);
    let body = match (config, record.status, record.data.as_ref()) {
        (Some(config), SourceStatus::Success, Some(payload)) => DisplayBody::Fields {
            rows: extract(
                payload,
                config.fields.iter().filter(|field| scope.includes(field)),
            ),
        },
        _ => {
            let error_message = record.error_message.as_deref().map(sanitize);
            let note = fallback_note(
                record,
                config.is_some(),
                &source_name,
                error_message.as_deref(),
            );
            DisplayBody::Fallback {
                error_message,
                note,
            }
        }
    };

    DisplayRecord {
        source_name,
        status: record.status,
        body,
    }
}

fn fallback_note(
    record: &SourceRecord,
    has_config: bool,
    display_name: &str,
    error_message: Option<&str>,
) -> String {
    if let Some(message) = error_message.filter(|m| !m.is_empty()) {
        return message.to_string();
    }
    match record.status {
        SourceStatus::Error => "Failed to fetch data".to_string(),
        SourceStatus::NotFound => "No record found".to_string(),
        SourceStatus::NotApplicable => "Not applicable to this indicator type".to_string(),
        _ if !has_config => format!("No data configuration available for {}", display_name),
        _ => "No data available".to_string(),
    }
}
