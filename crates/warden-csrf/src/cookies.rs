//! Tolerant cookie header parsing.
//!
//! Browsers and proxies produce messy cookie headers; unparseable
//! fragments are dropped silently, never surfaced as an error.

use std::collections::HashMap;

/// Parse a `Cookie` header into its well-formed `key=value` pairs.
///
/// Empty segments, segments without `=`, and segments with an empty key
/// or value are ignored. A value may itself contain `=`.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for segment in header.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        cookies.insert(key.to_string(), value.to_string());
    }
    cookies
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_well_formed_header() {
        let cookies = parse_cookie_header("csrf-token=tok123; other=x");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["csrf-token"], "tok123");
        assert_eq!(cookies["other"], "x");
    }

    #[test]
    fn test_malformed_fragments_are_dropped() {
        assert!(parse_cookie_header("a;;b=;;c").is_empty());
        assert!(parse_cookie_header("").is_empty());
        assert!(parse_cookie_header(";;;").is_empty());
        assert!(parse_cookie_header("=value").is_empty());
    }

    #[test]
    fn test_value_may_contain_equals() {
        let cookies = parse_cookie_header("session=a=b=c");
        assert_eq!(cookies["session"], "a=b=c");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let cookies = parse_cookie_header("  key = value ; next=1");
        assert_eq!(cookies["key"], "value");
        assert_eq!(cookies["next"], "1");
    }

    proptest! {
        #[test]
        fn parse_never_panics(header in ".{0,256}") {
            let _ = parse_cookie_header(&header);
        }

        #[test]
        fn parsed_pairs_are_well_formed(header in "[a-z=; ]{0,64}") {
            for (key, value) in parse_cookie_header(&header) {
                prop_assert!(!key.is_empty());
                prop_assert!(!value.is_empty());
                prop_assert!(!key.contains(';'));
            }
        }
    }
}
