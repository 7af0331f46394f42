//! JSON export of an assessed result set.
//!
//! The document mirrors what the user saw, minus display-only fields:
//! provider payloads are reshaped through the field tables so the export
//! carries labelled, formatted values rather than raw provider JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::{AnalysisResult, SourceStatus};
use crate::extract::FieldRow;
use crate::normalize::{normalize_scoped, DisplayBody, FieldScope};
use crate::obs;
use crate::sanitize::sanitize;

pub const EXPORT_TOOL_NAME: &str = "IOC Risk Assessment Tool";

/// Top-level export document.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub export_timestamp: String,
    pub total_iocs: usize,
    pub results: Vec<ExportResult>,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub tool: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub ioc: String,
    pub ioc_type: String,
    #[serde(rename = "riskScore")]
    pub risk_score: f64,
    pub summary: String,
    pub sources: Vec<ExportSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSource {
    pub source: String,
    pub status: SourceStatus,
    /// Label to formatted value, in field-table order.
    #[serde(serialize_with = "rows_as_map")]
    pub data: Vec<FieldRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn rows_as_map<S: Serializer>(
    rows: &[FieldRow],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(rows.len()))?;
    for row in rows {
        map.serialize_entry(&row.label, &row.value)?;
    }
    map.end()
}

/// Assemble the export document for `results` as of `now`.
pub fn build_export(results: &[AnalysisResult], now: DateTime<Utc>) -> ExportDocument {
    let results: Vec<ExportResult> = results.iter().map(export_result).collect();
    ExportDocument {
        export_timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_iocs: results.len(),
        results,
        metadata: ExportMetadata {
            tool: EXPORT_TOOL_NAME.to_string(),
            version: crate::VERSION.to_string(),
        },
    }
}

fn export_result(result: &AnalysisResult) -> ExportResult {
    let sources = normalize_scoped(&result.sources, FieldScope::Export)
        .into_iter()
        .map(|record| {
            let (data, error) = match record.body {
                DisplayBody::Fields { rows } => (rows, None),
                DisplayBody::Fallback { error_message, .. } => (Vec::new(), error_message),
            };
            ExportSource {
                source: record.source_name,
                status: record.status,
                data,
                error,
            }
        })
        .collect();

    ExportResult {
        ioc: sanitize(&result.indicator),
        ioc_type: sanitize(&result.indicator_type),
        risk_score: result.risk_score,
        summary: sanitize(&result.summary),
        sources,
    }
}

/// `ioc-assessment-YYYYMMDD-HHMMSS.json`, in UTC.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("ioc-assessment-{}.json", now.format("%Y%m%d-%H%M%S"))
}

/// Write `doc` as pretty JSON into `dir` and return the file path.
pub fn write_export_json(dir: &Path, doc: &ExportDocument, now: DateTime<Utc>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export dir {}", dir.display()))?;
    let path = dir.join(export_file_name(now));
    let json = serde_json::to_string_pretty(doc).context("failed to serialize export")?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write export {}", path.display()))?;
    obs::emit_export_written(&path, doc.total_iocs);
    Ok(path)
}
