//! Generic field extraction and formatting over provider payloads.
//!
//! Interprets [`FieldConfig`] tables: resolves each dotted path through a
//! nested JSON payload, formats the value by its declared type and runs
//! every output string through [`sanitize`]. Missing intermediate keys
//! resolve to absent; nothing here fails.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::sanitize::sanitize;
use crate::sources::{FieldConfig, ValueType};

/// Rendered for date values that cannot be interpreted.
pub const INVALID_DATE: &str = "Invalid Date";

/// Rendered for number values that are not numeric.
pub const NOT_A_NUMBER: &str = "NaN";

/// Rendered for empty or non-array values of an array field.
pub const EMPTY_ARRAY: &str = "None";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One display row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRow {
    pub label: String,
    pub value: String,
    /// True when `value` is the placeholder of an absent required field.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
}

/// Resolve a dotted path. `null` counts as absent.
///
/// Numeric segments index into arrays.
pub fn resolve_path<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Format a present value by type. Output is sanitized.
pub fn format_value(value: &Value, value_type: ValueType) -> String {
    let formatted = match value_type {
        ValueType::Percentage => format!("{}%", display_string(value)),
        ValueType::Number => match to_number(value) {
            Some(n) => group_thousands(n),
            None => NOT_A_NUMBER.to_string(),
        },
        ValueType::Date => format_date(date_from_value(value)),
        ValueType::Timestamp => format_date(
            to_number(value).and_then(|secs| millis_to_datetime(secs * 1000.0)),
        ),
        ValueType::Boolean => {
            if truthy(value) {
                "Yes".to_string()
            } else {
                "No".to_string()
            }
        }
        ValueType::Array => match value {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(display_string)
                .collect::<Vec<_>>()
                .join(", "),
            _ => EMPTY_ARRAY.to_string(),
        },
        ValueType::Text => display_string(value),
    };
    sanitize(&formatted)
}

/// Extract the configured rows from `payload`, in declaration order.
///
/// Required fields always yield a row; optional fields yield a row only
/// when present.
pub fn extract<'a, I>(payload: &Value, fields: I) -> Vec<FieldRow>
where
    I: IntoIterator<Item = &'a FieldConfig>,
{
    fields
        .into_iter()
        .filter_map(|field| match resolve_path(payload, field.path) {
            Some(value) => Some(FieldRow {
                label: sanitize(field.label),
                value: format_value(value, field.value_type),
                missing: false,
            }),
            None if field.required => Some(FieldRow {
                label: sanitize(field.label),
                value: sanitize(field.missing),
                missing: true,
            }),
            None => None,
        })
        .collect()
}

/// String form of a JSON value.
fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => plain_float(f),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(display_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn plain_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok().filter(|f| f.is_finite())
            }
        }
        _ => None,
    }
}

/// en-US style grouping with at most three fraction digits.
fn group_thousands(n: f64) -> String {
    if !n.is_finite() {
        return NOT_A_NUMBER.to_string();
    }
    let scaled = (n.abs() * 1000.0).round();
    if scaled >= 1e35 {
        return plain_float(n);
    }
    let scaled = scaled as u128;
    let (int_part, frac_part) = (scaled / 1000, scaled % 1000);

    let digits = int_part.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part > 0 {
        let frac = format!("{:03}", frac_part);
        grouped.push('.');
        grouped.push_str(frac.trim_end_matches('0'));
    }

    if n < 0.0 && scaled > 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn millis_to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms.round() as i64)
}

fn date_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(millis_to_datetime),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(dt) => dt.format(DATE_FORMAT).to_string(),
        None => INVALID_DATE.to_string(),
    }
}
