//! Line-level whitespace normalization and page artifact patterns.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Any run of whitespace, including tabs and non-breaking spaces
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    /// Regex for "Page N" and "Page N of M" style page numbers
    static ref RE_PAGE_NUM: Regex = Regex::new(r"(?i)^page\s+\d+(?:\s+of\s+\d+)?$").unwrap();

    /// Regex for "- N -" style page numbers
    static ref RE_DASH_PAGE: Regex = Regex::new(r"^-\s*\d+\s*-$").unwrap();

    /// Regex for "[N]" or "(N)" style page numbers
    static ref RE_BRACKET_PAGE: Regex = Regex::new(r"^[\[\(]\d+[\]\)]$").unwrap();

    /// Regex for standalone numbers
    static ref RE_STANDALONE_NUM: Regex = Regex::new(r"^\d+$").unwrap();

    /// Regex for dash, underscore or equals separators
    static ref RE_SEPARATOR: Regex = Regex::new(r"^[\s\-=_]{5,}$").unwrap();

    /// Digit runs, folded when comparing margin lines across pages
    static ref RE_DIGITS: Regex = Regex::new(r"\d+").unwrap();
}

/// Collapse every whitespace run to one space and trim the ends.
///
/// # Examples
///
/// ```
/// use pdf_reflow::text::whitespace::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  two\t\tcolumns \u{a0} here "), "two columns here");
/// ```
pub fn collapse_whitespace(line: &str) -> String {
    RE_WHITESPACE.replace_all(line.trim(), " ").into_owned()
}

/// Whether a (collapsed) line is nothing but a page number.
///
/// Recognizes `3`, `Page 3`, `Page 3 of 10`, `- 3 -`, `[3]` and `(3)`.
pub fn is_page_number(line: &str) -> bool {
    RE_STANDALONE_NUM.is_match(line)
        || RE_PAGE_NUM.is_match(line)
        || RE_DASH_PAGE.is_match(line)
        || RE_BRACKET_PAGE.is_match(line)
}

/// Whether a line is a horizontal rule drawn with text characters.
pub fn is_separator(line: &str) -> bool {
    RE_SEPARATOR.is_match(line)
}

/// Key used to recognize the same header or footer on different pages.
///
/// Whitespace is collapsed and digit runs become `#`, so running footers
/// such as "Journal of X, page 12" match across pages.
pub fn margin_key(line: &str) -> String {
    let collapsed = collapse_whitespace(line);
    RE_DIGITS.replace_all(&collapsed, "#").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a   b\tc"), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_page_numbers() {
        assert!(is_page_number("12"));
        assert!(is_page_number("Page 3"));
        assert!(is_page_number("page 3 of 10"));
        assert!(is_page_number("- 7 -"));
        assert!(is_page_number("[4]"));
        assert!(is_page_number("(4)"));
        assert!(!is_page_number("Table 3"));
        assert!(!is_page_number("3.2 Results"));
    }

    #[test]
    fn test_separator() {
        assert!(is_separator("-----"));
        assert!(is_separator("= = = = ="));
        assert!(!is_separator("--"));
        assert!(!is_separator("a----"));
    }

    #[test]
    fn test_margin_key_folds_digits() {
        assert_eq!(margin_key("Journal  of Things, page 12"), "Journal of Things, page #");
        assert_eq!(margin_key("Journal of Things, page 3"), margin_key("Journal of Things, page 12"));
    }
}
