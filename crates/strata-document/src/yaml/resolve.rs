//! Plain scalar tag resolution (YAML 1.2 core schema)

use crate::node::{BOOL_TAG, FLOAT_TAG, INT_TAG, NULL_TAG, STR_TAG};
use once_cell::sync::Lazy;
use regex::Regex;

static INT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+)$").expect("valid regex"));

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?|[-+]?\.(inf|Inf|INF)|\.(nan|NaN|NAN))$",
    )
    .expect("valid regex")
});

/// Resolve the tag a plain scalar would get
#[must_use]
pub(crate) fn resolve_plain(value: &str) -> &'static str {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => NULL_TAG,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => BOOL_TAG,
        _ if INT_RE.is_match(value) => INT_TAG,
        _ if FLOAT_RE.is_match(value) => FLOAT_TAG,
        _ => STR_TAG,
    }
}

/// Normalize an explicit tag to its short form
#[must_use]
pub(crate) fn short_tag(handle: &str, suffix: &str) -> String {
    match handle {
        "!!" | "tag:yaml.org,2002:" => format!("!!{suffix}"),
        _ => format!("{handle}{suffix}"),
    }
}

/// Check if a tag is one the emitter can leave implicit
#[must_use]
pub(crate) fn is_core_tag(tag: &str) -> bool {
    matches!(tag, NULL_TAG | BOOL_TAG | INT_TAG | FLOAT_TAG | STR_TAG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_core_schema() {
        assert_eq!(resolve_plain(""), NULL_TAG);
        assert_eq!(resolve_plain("~"), NULL_TAG);
        assert_eq!(resolve_plain("True"), BOOL_TAG);
        assert_eq!(resolve_plain("42"), INT_TAG);
        assert_eq!(resolve_plain("-7"), INT_TAG);
        assert_eq!(resolve_plain("0x1F"), INT_TAG);
        assert_eq!(resolve_plain("1.5"), FLOAT_TAG);
        assert_eq!(resolve_plain("1e3"), FLOAT_TAG);
        assert_eq!(resolve_plain(".inf"), FLOAT_TAG);
        assert_eq!(resolve_plain("yes"), STR_TAG);
        assert_eq!(resolve_plain("1.2.3"), STR_TAG);
        assert_eq!(resolve_plain("nginx:1.25"), STR_TAG);
    }

    #[test]
    fn short_tags() {
        assert_eq!(short_tag("!!", "str"), "!!str");
        assert_eq!(short_tag("tag:yaml.org,2002:", "int"), "!!int");
        assert_eq!(short_tag("!", "custom"), "!custom");
    }
}
