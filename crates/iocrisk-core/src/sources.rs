//! Declarative per-provider field tables.
//!
//! Each provider maps to an ordered list of fields: a dotted path into the
//! provider payload, a display label, a value type and whether the row is
//! required. Adding a provider is a data change here; the extractor in
//! [`crate::extract`] interprets these tables generically.

use serde::Serialize;

/// How a resolved value is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Value followed by `%`.
    Percentage,
    /// Locale-grouped numeral.
    Number,
    /// Date string or epoch milliseconds, rendered as a calendar date.
    Date,
    /// Whole seconds since the epoch, rendered as a calendar date.
    Timestamp,
    /// `Yes` / `No`.
    Boolean,
    /// Elements joined with `, `; empty renders `None`.
    Array,
    /// The value's string form.
    Text,
}

/// One declared field of a provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldConfig {
    pub path: &'static str,
    pub label: &'static str,
    pub value_type: ValueType,
    /// Required rows always render, with `missing` standing in for an
    /// absent value. Optional rows are omitted when absent.
    pub required: bool,
    pub missing: &'static str,
    /// Whether the field appears in exported documents.
    pub export: bool,
}

/// Placeholder for required fields without a field-specific message.
pub const DEFAULT_MISSING: &str = "No data";

impl FieldConfig {
    pub const fn required(
        path: &'static str,
        label: &'static str,
        value_type: ValueType,
        missing: &'static str,
    ) -> Self {
        Self {
            path,
            label,
            value_type,
            required: true,
            missing,
            export: true,
        }
    }

    pub const fn optional(path: &'static str, label: &'static str, value_type: ValueType) -> Self {
        Self {
            path,
            label,
            value_type,
            required: false,
            missing: DEFAULT_MISSING,
            export: true,
        }
    }

    /// Keep the field out of exported documents.
    pub const fn display_only(self) -> Self {
        Self {
            export: false,
            ..self
        }
    }
}

/// Field table for one provider, keyed by its exact source name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    pub name: &'static str,
    pub fields: &'static [FieldConfig],
}

use ValueType::*;

const VIRUSTOTAL_FIELDS: &[FieldConfig] = &[
    FieldConfig::required(
        "data.attributes.last_analysis_stats.malicious",
        "Malicious",
        Number,
        "No scan data",
    ),
    FieldConfig::required(
        "data.attributes.last_analysis_stats.suspicious",
        "Suspicious",
        Number,
        "No scan data",
    ),
    FieldConfig::required(
        "data.attributes.last_analysis_stats.harmless",
        "Clean",
        Number,
        "No scan data",
    ),
    FieldConfig::required(
        "data.attributes.last_analysis_stats.undetected",
        "Undetected",
        Number,
        "No scan data",
    ),
    FieldConfig::optional("data.attributes.last_analysis_date", "Last Scan", Timestamp),
    FieldConfig::optional("data.attributes.as_owner", "AS Owner", Text),
    FieldConfig::optional("data.attributes.country", "Country", Text),
    FieldConfig::optional("data.attributes.reputation", "Reputation", Number),
    FieldConfig::optional("data.attributes.network", "Network", Text),
    FieldConfig::optional("data.attributes.tags", "Tags", Array),
    FieldConfig::optional("permalink", "Permalink", Text).display_only(),
];

const ABUSEIPDB_FIELDS: &[FieldConfig] = &[
    FieldConfig::required(
        "abuseConfidenceScore",
        "Abuse Confidence",
        Percentage,
        "No confidence data",
    ),
    FieldConfig::required("totalReports", "Total Reports", Number, "No report data"),
    FieldConfig::optional("lastReportedAt", "Last Reported", Date),
    FieldConfig::optional("countryCode", "Country", Text),
    FieldConfig::optional("isp", "ISP", Text),
];

const IPINFO_FIELDS: &[FieldConfig] = &[
    FieldConfig::required("ip", "IP", Text, "No IP data"),
    FieldConfig::optional("hostname", "Hostname", Text),
    FieldConfig::optional("city", "City", Text),
    FieldConfig::optional("region", "Region", Text),
    FieldConfig::required("country", "Country", Text, "Unknown location"),
    FieldConfig::required("org", "Organization", Text, "Unknown org"),
    FieldConfig::optional("timezone", "Timezone", Text),
    FieldConfig::optional("anycast", "Anycast", Boolean),
];

/// All known providers.
pub const PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        name: "VirusTotal",
        fields: VIRUSTOTAL_FIELDS,
    },
    ProviderConfig {
        name: "AbuseIPDB",
        fields: ABUSEIPDB_FIELDS,
    },
    ProviderConfig {
        name: "IPInfo",
        fields: IPINFO_FIELDS,
    },
];

/// Look up a provider table by exact source name.
pub fn provider_config(source_name: &str) -> Option<&'static ProviderConfig> {
    PROVIDERS.iter().find(|p| p.name == source_name)
}
