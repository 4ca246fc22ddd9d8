use std::borrow::Cow;

/// Returns true for characters XML 1.0 cannot carry, even escaped.
///
/// Tab, newline and carriage return are the only C0 controls allowed.
fn is_forbidden(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0}'..='\u{1f}' | '\u{7f}' => true,
        '\u{fffe}' | '\u{ffff}' => true,
        _ => false,
    }
}

/// Strips control characters from text scraped off remote pages.
///
/// Page titles end up inside RSS `<title>` and `<description>` elements, and a
/// single stray `\x08` makes the whole document unparseable for strict readers.
///
/// Returns `Cow::Borrowed` when the input is already clean (the common case).
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_forbidden) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| !is_forbidden(*c)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_returns_borrowed() {
        let input = "Hello, world! This is clean text.";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_preserves_tabs_newlines_cr() {
        let input = "line1\nline2\ttabbed\r\nwindows";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strips_c0_controls_and_del() {
        assert_eq!(strip_control_chars("a\u{0}b\u{8}c\u{1b}d\u{7f}e"), "abcde");
    }

    #[test]
    fn test_strips_noncharacters() {
        assert_eq!(strip_control_chars("ok\u{fffe}\u{ffff}"), "ok");
    }

    #[test]
    fn test_unicode_untouched() {
        let input = "日本語のタイトル — café";
        assert!(matches!(strip_control_chars(input), Cow::Borrowed(_)));
    }
}
