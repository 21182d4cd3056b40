//! Bracket and brace scanning.
//!
//! The scanner finds top-level `[...]` / `{...}` groups in a value string
//! without splitting nested groups, and reports the running balance used to
//! decide whether an inline collection continues on the next line.

use crate::error::{Error, Result};

/// A delimiter pair understood by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pair {
    /// `[` and `]`, used by arrays and section headers.
    Bracket,
    /// `{` and `}`, used by inline tables.
    Brace,
}

impl Pair {
    pub fn open(&self) -> char {
        match self {
            Pair::Bracket => '[',
            Pair::Brace => '{',
        }
    }

    pub fn close(&self) -> char {
        match self {
            Pair::Bracket => ']',
            Pair::Brace => '}',
        }
    }

    fn from_open(ch: char) -> Option<Pair> {
        match ch {
            '[' => Some(Pair::Bracket),
            '{' => Some(Pair::Brace),
            _ => None,
        }
    }

    fn from_close(ch: char) -> Option<Pair> {
        match ch {
            ']' => Some(Pair::Bracket),
            '}' => Some(Pair::Brace),
            _ => None,
        }
    }
}

/// A balanced group found by the scanner, with its byte span in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Tracks whether the scan position is inside a quoted span.
///
/// A quote only opens a span where a value can start (after `[ { , = :` or
/// at the beginning), so apostrophes inside bare words are plain text.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct QuoteState {
    quote: Option<char>,
    prev: Option<char>,
}

impl QuoteState {
    /// Feeds one character. Returns `true` when it belongs to a quoted span,
    /// including the quote characters themselves.
    pub(crate) fn step(&mut self, ch: char) -> bool {
        if let Some(q) = self.quote {
            if ch == q {
                self.quote = None;
                self.prev = Some(ch);
            }
            return true;
        }

        if (ch == '"' || ch == '\'') && self.at_value_start() {
            self.quote = Some(ch);
            return true;
        }

        if !ch.is_whitespace() {
            self.prev = Some(ch);
        }
        false
    }

    fn at_value_start(&self) -> bool {
        matches!(self.prev, None | Some('[' | '{' | ',' | '=' | ':' | '('))
    }
}

/// Returns the top-level groups of one delimiter pair.
///
/// # Examples
///
/// ```
/// use hyconf::scan::{scan_groups, Pair};
///
/// let groups = scan_groups("[1,[2,3],4]", Pair::Bracket).unwrap();
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].text, "[1,[2,3],4]");
///
/// assert!(scan_groups("[1,[2,3]", Pair::Bracket).is_err());
/// ```
pub fn scan_groups(text: &str, pair: Pair) -> Result<Vec<Group<'_>>> {
    let open = pair.open();
    let close = pair.close();
    let mut groups = Vec::new();
    let mut quotes = QuoteState::default();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, ch) in text.char_indices() {
        if quotes.step(ch) {
            continue;
        }

        if ch == open {
            if depth == 0 {
                start = i;
            }
            depth += 1;
        } else if ch == close {
            if depth == 0 {
                return Err(Error::unbalanced(open));
            }
            depth -= 1;
            if depth == 0 {
                let end = i + ch.len_utf8();
                groups.push(Group {
                    start,
                    end,
                    text: &text[start..end],
                });
            }
        }
    }

    if depth > 0 {
        return Err(Error::unbalanced(close));
    }

    Ok(groups)
}

/// Returns the top-level groups of either pair, checking that pairs nest
/// properly (`[}` is rejected).
pub fn scan_any(text: &str) -> Result<Vec<Group<'_>>> {
    let mut groups = Vec::new();
    let mut quotes = QuoteState::default();
    let mut stack: Vec<Pair> = Vec::new();
    let mut start = 0usize;

    for (i, ch) in text.char_indices() {
        if quotes.step(ch) {
            continue;
        }

        if let Some(pair) = Pair::from_open(ch) {
            if stack.is_empty() {
                start = i;
            }
            stack.push(pair);
        } else if let Some(pair) = Pair::from_close(ch) {
            match stack.pop() {
                Some(open) if open == pair => {}
                Some(open) => return Err(Error::unbalanced(open.close())),
                None => return Err(Error::unbalanced(pair.open())),
            }
            if stack.is_empty() {
                let end = i + ch.len_utf8();
                groups.push(Group {
                    start,
                    end,
                    text: &text[start..end],
                });
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::unbalanced(open.close()));
    }

    Ok(groups)
}

/// Net count of unquoted opening minus closing brackets and braces.
///
/// A positive balance means an inline collection continues on the next line.
pub fn balance(text: &str) -> isize {
    let mut quotes = QuoteState::default();
    let mut depth = 0isize;

    for ch in text.chars() {
        if quotes.step(ch) {
            continue;
        }
        match ch {
            '[' | '{' => depth += 1,
            ']' | '}' => depth -= 1,
            _ => {}
        }
    }

    depth
}

/// Splits `text` on `delim` outside quoted spans.
pub(crate) fn split_unquoted(text: &str, delim: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quotes = QuoteState::default();
    let mut last = 0usize;

    for (i, ch) in text.char_indices() {
        if quotes.step(ch) {
            continue;
        }
        if ch == delim {
            parts.push(&text[last..i]);
            last = i + ch.len_utf8();
        }
    }
    parts.push(&text[last..]);

    parts
}

/// Byte index of the first unquoted character matching `pred`.
pub(crate) fn find_unquoted(text: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    let mut quotes = QuoteState::default();

    for (i, ch) in text.char_indices() {
        if quotes.step(ch) {
            continue;
        }
        if pred(ch) {
            return Some(i);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn finds_each_top_level_group() {
        let groups = scan_groups("a = [1, 2], b = [3, [4]]", Pair::Bracket).unwrap();
        let texts: Vec<&str> = groups.iter().map(|g| g.text).collect();
        assert_eq!(texts, vec!["[1, 2]", "[3, [4]]"]);
        assert_eq!(groups[0].start, 4);
        assert_eq!(groups[0].end, 10);
    }

    #[test]
    fn excess_close_is_unbalanced() {
        let err = scan_groups("[1]]", Pair::Bracket).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnbalancedDelimiter);
    }

    #[test]
    fn ignores_brackets_in_quotes() {
        let groups = scan_groups(r#"["a]b", 'c[d']"#, Pair::Bracket).unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn apostrophe_inside_word_is_text() {
        let groups = scan_groups("[it's, fine]", Pair::Bracket).unwrap();
        assert_eq!(groups[0].text, "[it's, fine]");
    }

    #[test]
    fn scan_any_rejects_crossed_pairs() {
        assert!(scan_any("[a}").is_err());
        let groups = scan_any("{a = [1]}, [2]").unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn balance_counts_open_pairs() {
        assert_eq!(balance("[1, {a = 2"), 2);
        assert_eq!(balance("[1]"), 0);
        assert_eq!(balance("]"), -1);
    }

    #[test]
    fn split_respects_quotes() {
        assert_eq!(split_unquoted(r#"a, "b,c", d"#, ','), vec!["a", r#" "b,c""#, " d"]);
    }
}
