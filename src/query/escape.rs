//! Escaping of reserved query-syntax characters.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RESERVED: Regex =
        Regex::new(r#"([+\-&|!(){}\[\]^"~*?:\\/])"#).expect("reserved character pattern");
    static ref RESERVED_OR_SPACE: Regex =
        Regex::new(r#"([+\-&|!(){}\[\]^"~*?:\\/\s])"#).expect("reserved character pattern");
}

/// Backslash-escape every reserved character and all whitespace in a single
/// token, so the token stays one term inside its field scope.
pub fn escape(token: &str) -> String {
    RESERVED_OR_SPACE.replace_all(token, r"\$1").into_owned()
}

/// Backslash-escape reserved characters inside a quoted phrase. Whitespace
/// is left alone; the quotes already hold the phrase together.
pub fn escape_phrase(phrase: &str) -> String {
    RESERVED.replace_all(phrase, r"\$1").into_owned()
}

/// Escape each whitespace separated token on its own and re-join them with a
/// single space.
pub fn escape_tokens(text: &str) -> String {
    text.split_whitespace()
        .map(escape)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap in double quotes.
pub fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_reserved() {
        assert_eq!(escape("a-b"), r"a\-b");
        assert_eq!(escape("c++"), r"c\+\+");
        assert_eq!(escape("2020-01-01T00:00:00Z"), r"2020\-01\-01T00\:00\:00Z");
        assert_eq!(escape(r#"say "hi""#), r#"say\ \"hi\""#);
        assert_eq!(escape(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_escape_leaves_plain_text() {
        assert_eq!(escape("pizza"), "pizza");
        assert_eq!(escape_phrase("new york"), "new york");
    }

    #[test]
    fn test_escape_whitespace() {
        assert_eq!(escape("new york"), r"new\ york");
        assert_eq!(escape("a\tb"), "a\\\tb");
        assert_eq!(escape_phrase("ben & jerry"), r"ben \& jerry");
    }

    #[test]
    fn test_escape_tokens_per_token() {
        assert_eq!(escape_tokens("  hot-dog   (stand) "), r"hot\-dog \(stand\)");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("jon"), "\"jon\"");
        assert_eq!(quote(""), "\"\"");
    }
}
