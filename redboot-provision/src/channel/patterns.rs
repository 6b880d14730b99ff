//! Pattern matching utilities for prompt detection.

use regex::bytes::Regex;

/// Compile a console pattern with `^` and `$` anchored at line boundaries.
///
/// Console output arrives as one running stream, so a prompt written as
/// `^RedBoot>` has to match at any line start, not just at buffer start.
pub fn compile_multiline(pattern: &str) -> Result<Regex, regex::Error> {
    if pattern.starts_with("(?m)") {
        Regex::new(pattern)
    } else {
        Regex::new(&format!("(?m){}", pattern))
    }
}

/// Return the first marker that occurs in `text`.
pub fn first_marker<'a>(text: &str, markers: &[&'a str]) -> Option<&'a str> {
    markers.iter().copied().find(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiline_anchor() {
        let pattern = compile_multiline(r"^RedBoot>").unwrap();
        assert!(pattern.is_match(b"RedBoot> "));
        assert!(pattern.is_match(b"fis list\nRedBoot> "));
        assert!(!pattern.is_match(b"echo RedBoot> "));
    }

    #[test]
    fn test_existing_flag_not_doubled() {
        let pattern = compile_multiline(r"(?m)^RedBoot>").unwrap();
        assert_eq!(pattern.as_str(), r"(?m)^RedBoot>");
    }

    #[test]
    fn test_first_marker() {
        let markers = ["** Error", "Can't load"];
        assert_eq!(
            first_marker("Can't load 'x': file not found", &markers),
            Some("Can't load")
        );
        assert_eq!(first_marker("Raw file loaded", &markers), None);
    }
}
