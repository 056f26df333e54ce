//! Utility functions for line handling, URL parsing and pattern counting.
//!
//! Everything here is pure and synchronous.

use crate::error::UrlCountError;
use memchr::memmem;
use reqwest::Url;

/// Remove trailing `\n` and `\r` characters from an input line.
///
/// Leading whitespace and interior characters are left untouched.
pub fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Parse a trimmed input line as an absolute URL.
///
/// # Errors
///
/// Returns `UrlCountError::InvalidUrl` for empty lines and anything the URL
/// parser rejects, including relative references.
pub fn parse_url(line: &str) -> Result<Url, UrlCountError> {
    if line.is_empty() {
        return Err(UrlCountError::invalid_url(line, "empty line"));
    }

    Url::parse(line).map_err(|e| UrlCountError::invalid_url(line, e.to_string()))
}

/// Count non-overlapping occurrences of `pattern` in `haystack`.
///
/// The scan runs left to right; after a match it resumes right after the
/// end of that match. Matching is byte-exact and therefore case-sensitive.
/// An empty pattern matches nothing.
///
/// ```
/// use url_count_lib::count_occurrences;
///
/// assert_eq!(count_occurrences(b"GoGoGo", b"Go"), 3);
/// assert_eq!(count_occurrences(b"aaaa", b"aa"), 2);
/// ```
pub fn count_occurrences(haystack: &[u8], pattern: &[u8]) -> u64 {
    if pattern.is_empty() {
        return 0;
    }

    memmem::find_iter(haystack, pattern).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_non_overlapping() {
        assert_eq!(count_occurrences(b"GoGo", b"Go"), 2);
        assert_eq!(count_occurrences(b"GoGoGo", b"Go"), 3);
        assert_eq!(count_occurrences(b"aaa", b"aa"), 1);
        assert_eq!(count_occurrences(b"abababa", b"aba"), 2);
    }

    #[test]
    fn test_count_adversarial_input() {
        let haystack = vec![b'a'; 1 << 20];
        let mut pattern = vec![b'a'; 1000];
        pattern.push(b'b');
        assert_eq!(count_occurrences(&haystack, &pattern), 0);

        let pattern = vec![b'a'; 1000];
        assert_eq!(count_occurrences(&haystack, &pattern), (1 << 20) / 1000);
    }

    #[test]
    fn test_count_no_occurrence() {
        assert_eq!(count_occurrences(b"Rust only", b"Go"), 0);
        assert_eq!(count_occurrences(b"", b"Go"), 0);
        assert_eq!(count_occurrences(b"G", b"Go"), 0);
    }

    #[test]
    fn test_count_is_case_sensitive() {
        assert_eq!(count_occurrences(b"go GO gO Go", b"Go"), 1);
    }

    #[test]
    fn test_count_empty_pattern() {
        assert_eq!(count_occurrences(b"anything", b""), 0);
    }

    #[test]
    fn test_count_multibyte_pattern() {
        let body = "¡Go! café Go café".as_bytes();
        assert_eq!(count_occurrences(body, "café".as_bytes()), 2);
        assert_eq!(count_occurrences(body, b"Go"), 2);
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending("https://a.test\n"), "https://a.test");
        assert_eq!(trim_line_ending("https://a.test\r\n"), "https://a.test");
        assert_eq!(trim_line_ending("https://a.test"), "https://a.test");
        assert_eq!(trim_line_ending("  x \r\r\n"), "  x ");
        assert_eq!(trim_line_ending("\n"), "");
    }

    #[test]
    fn test_parse_url() {
        let url = parse_url("https://example.test/a").unwrap();
        assert_eq!(url.as_str(), "https://example.test/a");

        // Normalized form gains a trailing slash
        let url = parse_url("https://example.test").unwrap();
        assert_eq!(url.as_str(), "https://example.test/");
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        assert!(matches!(
            parse_url("not a url"),
            Err(UrlCountError::InvalidUrl { .. })
        ));
        assert!(matches!(parse_url(""), Err(UrlCountError::InvalidUrl { .. })));
        assert!(matches!(
            parse_url("/relative/path"),
            Err(UrlCountError::InvalidUrl { .. })
        ));
    }
}
