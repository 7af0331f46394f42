//! Read-time pipeline: decoded results through normalization, risk bands,
//! defanging and export, the way a front end consumes a session.

use chrono::{TimeZone, Utc};
use iocrisk_core::fakes::sample_result;
use iocrisk_core::{
    build_export, classify, decode_result, defang, normalize, DisplayBody, RiskBand,
    SourceStatus,
};
use serde_json::json;

#[test]
fn sample_result_renders_every_source() {
    let result = decode_result(&sample_result("1.1.1.1", 85)).unwrap();
    let records = normalize(&result.sources);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source_name, "AbuseIPDB");
    assert_eq!(records[0].status, SourceStatus::Success);
    let abuse: Vec<_> = records[0]
        .rows()
        .iter()
        .map(|r| (r.label.as_str(), r.value.as_str()))
        .collect();
    assert_eq!(abuse[0], ("Abuse Confidence", "85%"));
    assert_eq!(abuse[1], ("Total Reports", "12"));

    let ipinfo = &records[1];
    let org = ipinfo
        .rows()
        .iter()
        .find(|r| r.label == "Organization")
        .unwrap();
    assert_eq!(org.value, "AS13335 Cloudflare, Inc.");
    assert!(!org.missing);

    assert_eq!(classify(result.risk_score).band, RiskBand::High);
    assert_eq!(defang(&result.indicator, &result.indicator_type), "1[.]1[.]1[.]1");
}

#[test]
fn hostile_provider_payload_is_inert() {
    let result = decode_result(&json!({
        "ioc": "evil.com",
        "ioc_type": "domain",
        "risk_score": 45,
        "summary": "ok",
        "sources": [
            {
                "source": "IPInfo",
                "status": "success",
                "data": {
                    "ip": "<img src=x onerror=alert(1)>93.184.216.34",
                    "org": "<script>document.cookie</script>Example Org"
                }
            },
            {
                "source": "<b>Shodan</b>",
                "status": "error",
                "error": "<iframe src=//x></iframe>timeout"
            }
        ]
    }))
    .unwrap();

    let records = normalize(&result.sources);
    for row in records[0].rows() {
        assert!(!row.value.contains('<'), "{:?}", row);
        assert!(!row.value.contains("script"), "{:?}", row);
    }
    // country is required and absent
    let country = records[0]
        .rows()
        .iter()
        .find(|r| r.label == "Country")
        .unwrap();
    assert!(country.missing);
    assert_eq!(country.value, "Unknown location");

    assert_eq!(records[1].source_name, "Shodan");
    match &records[1].body {
        DisplayBody::Fallback { error_message, .. } => {
            assert_eq!(error_message.as_deref(), Some("timeout"))
        }
        other => panic!("expected fallback, got {:?}", other),
    }
}

#[test]
fn export_matches_display_minus_display_only_fields() {
    let results = vec![
        decode_result(&sample_result("1.1.1.1", 10)).unwrap(),
        decode_result(&sample_result("2.2.2.2", 75)).unwrap(),
    ];
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let doc = build_export(&results, now);

    assert_eq!(doc.total_iocs, 2);
    assert_eq!(doc.results[1].ioc, "2.2.2.2");
    assert_eq!(doc.results[1].risk_score, 75.0);

    let display = normalize(&results[0].sources);
    let exported = &doc.results[0].sources;
    assert_eq!(display.len(), exported.len());
    for (shown, out) in display.iter().zip(exported) {
        assert_eq!(shown.source_name, out.source);
        assert_eq!(shown.rows(), out.data.as_slice());
    }
}
