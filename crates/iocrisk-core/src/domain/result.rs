//! Wire types for the assessment service and shape validation of its results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::MalformedRecord;

/// Request body for `POST /api/assess`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessRequest {
    pub iocs: Vec<String>,
}

/// Raw response envelope.
///
/// Results stay untyped here; each one is shape-checked by
/// [`decode_results`] so that a single bad record cannot fail the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessResponse {
    /// Absent or `null` `results` means an empty result set.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_processed: Option<u64>,
    /// Server-side processing time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl AssessResponse {
    pub fn stats(&self) -> ResponseStats {
        ResponseStats {
            total_processed: self.total_processed,
            processing_time: self.processing_time,
        }
    }
}

/// Envelope metadata kept on the session after a successful call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseStats {
    pub total_processed: Option<u64>,
    pub processing_time: Option<f64>,
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub version: String,
}

/// Outcome reported by a single provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Success,
    Error,
    NotFound,
    NotApplicable,
    #[default]
    #[serde(other)]
    Unknown,
}

impl SourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::NotFound => "not_found",
            Self::NotApplicable => "not_applicable",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, provider-shaped finding. Never mutated; read through the field
/// extractor only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "source", default)]
    pub source_name: String,
    #[serde(default)]
    pub status: SourceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Assessment of one submitted indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "ioc")]
    pub indicator: String,
    #[serde(rename = "ioc_type")]
    pub indicator_type: String,
    /// 0..=100, enforced by [`decode_result`].
    pub risk_score: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Shape-check one raw result record.
pub fn decode_result(raw: &Value) -> Result<AnalysisResult, MalformedRecord> {
    let obj = raw.as_object().ok_or(MalformedRecord::NotAnObject)?;

    let indicator = required_str(obj, "ioc")?;
    let indicator_type = required_str(obj, "ioc_type")?;

    let risk_score = obj
        .get("risk_score")
        .and_then(Value::as_f64)
        .ok_or(MalformedRecord::FieldType { field: "risk_score" })?;
    if !(0.0..=100.0).contains(&risk_score) {
        return Err(MalformedRecord::ScoreOutOfRange(risk_score));
    }

    let summary = match obj.get("summary") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(MalformedRecord::FieldType { field: "summary" }),
    };

    let sources = match obj.get("sources") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                if !item.is_object() {
                    return Err(MalformedRecord::FieldType { field: "sources" });
                }
                serde_json::from_value::<SourceRecord>(item.clone())
                    .map_err(|_| MalformedRecord::FieldType { field: "sources" })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(MalformedRecord::FieldType { field: "sources" }),
    };

    let timestamp = obj
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(AnalysisResult {
        indicator,
        indicator_type,
        risk_score,
        summary,
        sources,
        timestamp,
    })
}

/// Decode a result list, dropping records that fail their shape contract.
///
/// Returns the kept results in input order and the number dropped.
pub fn decode_results(raw: &[Value]) -> (Vec<AnalysisResult>, usize) {
    let mut kept = Vec::with_capacity(raw.len());
    let mut dropped = 0;
    for (index, value) in raw.iter().enumerate() {
        match decode_result(value) {
            Ok(result) => kept.push(result),
            Err(reason) => {
                crate::obs::emit_record_dropped(index, &reason);
                dropped += 1;
            }
        }
    }
    (kept, dropped)
}

fn required_str(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, MalformedRecord> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(MalformedRecord::FieldType { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn well_formed() -> Value {
        json!({
            "ioc": "8.8.8.8",
            "ioc_type": "ip",
            "risk_score": 12,
            "summary": "Low risk",
            "sources": [
                {"source": "AbuseIPDB", "status": "success", "data": {"totalReports": 0}},
                {"source": "VirusTotal", "status": "error", "error": "quota exceeded"}
            ],
            "timestamp": "2025-07-20T00:00:00"
        })
    }

    #[test]
    fn test_decode_well_formed_result() {
        let result = decode_result(&well_formed()).unwrap();
        assert_eq!(result.indicator, "8.8.8.8");
        assert_eq!(result.indicator_type, "ip");
        assert_eq!(result.risk_score, 12.0);
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].status, SourceStatus::Success);
        assert_eq!(
            result.sources[1].error_message.as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(result.timestamp.as_deref(), Some("2025-07-20T00:00:00"));
    }

    #[test]
    fn test_score_out_of_range_is_malformed() {
        let mut raw = well_formed();
        raw["risk_score"] = json!(101);
        assert!(matches!(
            decode_result(&raw),
            Err(MalformedRecord::ScoreOutOfRange(_))
        ));

        raw["risk_score"] = json!(-1);
        assert!(decode_result(&raw).is_err());
    }

    #[test]
    fn test_wrong_field_types_are_malformed() {
        let mut raw = well_formed();
        raw["risk_score"] = json!("high");
        assert_eq!(
            decode_result(&raw).unwrap_err(),
            MalformedRecord::FieldType { field: "risk_score" }
        );

        let mut raw = well_formed();
        raw["sources"] = json!({"source": "VirusTotal"});
        assert_eq!(
            decode_result(&raw).unwrap_err(),
            MalformedRecord::FieldType { field: "sources" }
        );

        let mut raw = well_formed();
        raw["ioc_type"] = json!(4);
        assert_eq!(
            decode_result(&raw).unwrap_err(),
            MalformedRecord::FieldType { field: "ioc_type" }
        );

        assert_eq!(
            decode_result(&json!("8.8.8.8")).unwrap_err(),
            MalformedRecord::NotAnObject
        );
    }

    #[test]
    fn test_missing_optional_parts_default() {
        let raw = json!({"ioc": "evil.com", "ioc_type": "domain", "risk_score": 0});
        let result = decode_result(&raw).unwrap();
        assert!(result.summary.is_empty());
        assert!(result.sources.is_empty());
        assert!(result.timestamp.is_none());
    }

    #[test]
    fn test_unknown_source_status_decodes_as_unknown() {
        let raw = json!({
            "ioc": "evil.com", "ioc_type": "domain", "risk_score": 50,
            "sources": [{"source": "Shodan", "status": "rate_limited"}, {}]
        });
        let result = decode_result(&raw).unwrap();
        assert_eq!(result.sources[0].status, SourceStatus::Unknown);
        assert_eq!(result.sources[1].status, SourceStatus::Unknown);
        assert!(result.sources[1].source_name.is_empty());
    }

    #[test]
    fn test_decode_results_counts_dropped_and_keeps_order() {
        let mut bad = well_formed();
        bad["risk_score"] = json!(250);
        let mut second = well_formed();
        second["ioc"] = json!("1.1.1.1");

        let (kept, dropped) = decode_results(&[well_formed(), bad, json!(null), second]);
        assert_eq!(dropped, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].indicator, "8.8.8.8");
        assert_eq!(kept[1].indicator, "1.1.1.1");
    }

    #[test]
    fn test_response_without_results_is_empty() {
        let response: AssessResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.stats(), ResponseStats::default());

        let response: AssessResponse =
            serde_json::from_str(r#"{"results": [], "total_processed": 0, "processing_time": 0.25}"#)
                .unwrap();
        assert_eq!(response.stats().total_processed, Some(0));
        assert_eq!(response.stats().processing_time, Some(0.25));
    }

    #[test]
    fn test_null_results_is_empty() {
        let response: AssessResponse =
            serde_json::from_str(r#"{"results": null, "total_processed": 0}"#).unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.total_processed, Some(0));
    }

    #[test]
    fn test_non_array_results_is_rejected() {
        assert!(serde_json::from_str::<AssessResponse>(r#"{"results": {}}"#).is_err());
    }
}
