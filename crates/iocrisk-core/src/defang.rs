//! Display-safe rendering of indicators.
//!
//! Defanged indicators cannot be activated by accident when displayed or
//! copied: dots become `[.]` and a leading `http` becomes `hXXp`.

/// Defang `indicator` according to its backend-reported type.
///
/// Dispatch is on the lower-cased type:
/// - `ip` and any unknown type: dot substitution only
/// - `domain`, `url`: dot substitution, then a leading case-insensitive
///   `http` becomes `hXXp`
/// - `hash`, `file`: unchanged
pub fn defang(indicator: &str, indicator_type: &str) -> String {
    if indicator.is_empty() {
        return String::new();
    }

    match indicator_type.to_lowercase().as_str() {
        "hash" | "file" => indicator.to_string(),
        "domain" | "url" => neutralize_scheme(&bracket_dots(indicator)),
        _ => bracket_dots(indicator),
    }
}

fn bracket_dots(s: &str) -> String {
    s.replace('.', "[.]")
}

fn neutralize_scheme(s: &str) -> String {
    match s.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("http") => format!("hXXp{}", &s[4..]),
        _ => s.to_string(),
    }
}
