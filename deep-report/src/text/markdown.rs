//! Markdown stripping for plain-text consumers (speech, PDF, DOCX).

use once_cell::sync::Lazy;
use regex::Regex;

/// Emphasis patterns, strongest first so `**x**` is not read as two `*` runs.
static EMPHASIS: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        Regex::new(r"\*\*(.*?)\*\*").expect("bold regex is valid"),
        Regex::new(r"__(.*?)__").expect("bold regex is valid"),
        Regex::new(r"\*(.*?)\*").expect("italic regex is valid"),
        Regex::new(r"_(.*?)_").expect("italic regex is valid"),
    ]
});

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#+[ \t]+").expect("heading regex is valid"));

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").expect("list marker regex is valid"));

/// Remove markdown syntax, keeping the readable text.
///
/// Handles emphasis (`**`, `__`, `*`, `_`), heading markers and bullet list
/// markers. Links, tables and code blocks pass through unchanged.
pub fn strip_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut result = text.to_string();
    for pattern in EMPHASIS.iter() {
        result = pattern.replace_all(&result, "$1").into_owned();
    }
    let result = HEADING.replace_all(&result, "");
    LIST_MARKER.replace_all(&result, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_emphasis() {
        assert_eq!(strip_markdown("**Bold** and __strong__"), "Bold and strong");
        assert_eq!(strip_markdown("*it* and _em_"), "it and em");
        assert_eq!(strip_markdown("***both***"), "both");
    }

    #[test]
    fn test_strip_headings() {
        let text = "# Title\n## Section\nBody #hashtag";
        assert_eq!(strip_markdown(text), "Title\nSection\nBody #hashtag");
    }

    #[test]
    fn test_strip_list_markers() {
        let text = "Intro:\n- one\n  * two\n+ three\n-not a list";
        assert_eq!(strip_markdown(text), "Intro:\none\ntwo\nthree\n-not a list");
    }

    #[test]
    fn test_keeps_blank_lines() {
        let text = "**Report**\n\nFirst paragraph.\n\n- point";
        assert_eq!(strip_markdown(text), "Report\n\nFirst paragraph.\n\npoint");
    }

    #[test]
    fn test_emphasis_does_not_cross_lines() {
        assert_eq!(strip_markdown("a * b\nc * d"), "a * b\nc * d");
    }

    #[test]
    fn test_empty() {
        assert_eq!(strip_markdown(""), "");
    }
}
