//! Markup stripping for untrusted strings.
//!
//! Applied to every validation message, user-facing error, formatted field
//! value and provider-reported error before it is treated as displayable.
//! The output contains no `<` or `>`; executable blocks are removed along
//! with their content, other tags are dropped and their text kept. Runs in
//! linear time: every regex is applied once.

use once_cell::sync::Lazy;
use regex::Regex;

/// Elements whose content is never inert text.
static RE_ACTIVE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<\s*(script|style|iframe|object|embed|template|noscript)\b[^>]*>.*?<\s*/\s*(script|style|iframe|object|embed|template|noscript)\s*>",
    )
    .expect("valid active block regex")
});

static RE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid tag regex"));

/// Strip active markup, leaving inert text only.
///
/// Total and idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    if !text.contains('<') && !text.contains('>') {
        return text.to_string();
    }

    // One pass; anything left over, including halves of spliced tags such
    // as `<scr<b>ipt>`, is escaped below.
    let stripped = RE_ACTIVE_BLOCK.replace_all(text, "");
    let stripped = RE_COMMENT.replace_all(&stripped, "");
    let stripped = RE_TAG.replace_all(&stripped, "");

    stripped.replace('<', "&lt;").replace('>', "&gt;")
}
