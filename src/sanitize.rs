//! Accessor identifiers derived from raw field names.
//!
//! Only the trailing-character cases physics ntuples commonly produce are
//! rewritten. Embedded dots and spaces pass through untouched and are then
//! rejected as invalid identifiers when the record type is synthesized.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap()
});

/// Map a raw field name to an accessor identifier.
///
/// A trailing `.` is dropped; a trailing space (after that) becomes `_`.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.strip_suffix('.').unwrap_or(raw);

    match trimmed.strip_suffix(' ') {
        Some(stem) => format!("{}_", stem),
        None => trimmed.to_string(),
    }
}

pub fn is_valid_identifier(identifier: &str) -> bool {
    IDENTIFIER_REGEX.is_match(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_dot_dropped() {
        assert_eq!(sanitize("foo."), "foo");
    }

    #[test]
    fn test_trailing_space_replaced() {
        assert_eq!(sanitize("foo "), "foo_");
        assert_eq!(sanitize("foo ."), "foo_");
    }

    #[test]
    fn test_only_one_trailing_char_rewritten() {
        assert_eq!(sanitize("foo.."), "foo.");
        assert_eq!(sanitize("foo  "), "foo _");
    }

    #[test]
    fn test_embedded_dot_is_a_known_limitation() {
        // Not rewritten here; synthesis rejects it as an invalid identifier.
        assert_eq!(sanitize("foo.bar"), "foo.bar");
        assert!(!is_valid_identifier(&sanitize("foo.bar")));

        assert_eq!(sanitize("foo bar"), "foo bar");
        assert!(!is_valid_identifier(&sanitize("foo bar")));
    }

    #[test]
    fn test_identifier_validity() {
        assert!(is_valid_identifier("px"));
        assert!(is_valid_identifier("_x1"));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier(""));
    }
}
