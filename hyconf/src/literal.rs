//! Scalar literals: quote handling and trailing comments.

use crate::scan::QuoteState;

/// Cuts `text` at the first `#` or `;` that is outside quotes, brackets and
/// braces.
///
/// # Examples
///
/// ```
/// use hyconf::literal::strip_comment;
///
/// assert_eq!(strip_comment("8080 # web port"), "8080 ");
/// assert_eq!(strip_comment("[a#1, b;2]"), "[a#1, b;2]");
/// assert_eq!(strip_comment("\"#fff\" ; colour"), "\"#fff\" ");
/// ```
pub fn strip_comment(text: &str) -> &str {
    let mut quotes = QuoteState::default();
    let mut depth = 0usize;

    for (i, ch) in text.char_indices() {
        if quotes.step(ch) {
            continue;
        }
        match ch {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            '#' | ';' if depth == 0 => return &text[..i],
            _ => {}
        }
    }

    text
}

/// Parses a single-line scalar value.
///
/// A value starting with a quote yields the text up to the matching quote and
/// ignores whatever follows. An unterminated quote keeps the text as written.
/// Unquoted values lose any trailing comment and surrounding whitespace.
/// Escape sequences are not interpreted.
///
/// # Examples
///
/// ```
/// use hyconf::literal::parse_literal;
///
/// assert_eq!(parse_literal(r#""a # b" # note"#), "a # b");
/// assert_eq!(parse_literal("'single'"), "single");
/// assert_eq!(parse_literal("plain ; note"), "plain");
/// assert_eq!(parse_literal("\"open"), "\"open");
/// ```
pub fn parse_literal(raw: &str) -> String {
    let text = raw.trim();

    if let Some(quote) = text.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let body = &text[quote.len_utf8()..];
        return match body.find(quote) {
            Some(end) => body[..end].to_string(),
            None => text.to_string(),
        };
    }

    strip_comment(text).trim().to_string()
}

/// Removes one pair of matching surrounding quotes, if present.
///
/// ```
/// use hyconf::literal::unquote;
///
/// assert_eq!(unquote(" \"x\" "), "x");
/// assert_eq!(unquote("'x\""), "'x\"");
/// ```
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Normalizes a key into its dotted segments.
///
/// Whitespace around the key and each segment is dropped, runs of dots
/// collapse, and dots inside a quoted segment do not split it.
pub(crate) fn key_segments(raw: &str) -> Vec<String> {
    let key = raw.trim();
    let mut segments = Vec::new();
    let mut quote: Option<char> = None;
    let mut last = 0usize;

    for (i, ch) in key.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(ch),
            (None, '.') => {
                segments.push(&key[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&key[last..]);

    segments
        .into_iter()
        .map(|segment| unquote(segment).trim())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins key segments with single dots (`a..b` becomes `a.b`).
pub(crate) fn normalize_path(raw: &str) -> String {
    key_segments(raw).join(".")
}
