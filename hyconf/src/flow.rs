//! Inline `[...]` and `{...}` collections.
//!
//! Nested groups are swapped for placeholder tokens before the outer level is
//! split on commas, so a comma inside `[1, [2, 3]]` never splits the inner
//! list. Each placeholder is parsed recursively afterwards.

use crate::error::{Error, ErrorKind, Result};
use crate::literal::{key_segments, strip_comment, unquote};
use crate::scan::{self, find_unquoted, split_unquoted};
use crate::tree::insert_path;
use crate::value::{Table, Value};
use tracing::debug;

/// Characters placeholders may be built from. The first one absent from the
/// text being flattened is used, so input can never contain a placeholder.
const MARKS: std::ops::RangeInclusive<char> = '\u{E000}'..='\u{F8FF}';

/// Parses a balanced inline collection such as `[1, {a = 2}]`.
///
/// Text that does not start with `[` or `{` is returned as an unquoted scalar.
/// Anything after the first top-level group is ignored.
///
/// # Examples
///
/// ```
/// use hyconf::flow::parse_flow;
/// use hyconf::Value;
///
/// let value = parse_flow("[80, [443, 8443]]", 64).unwrap();
/// assert_eq!(
///     value,
///     Value::from(vec![Value::from("80"), Value::from(vec!["443", "8443"])])
/// );
/// ```
pub fn parse_flow(text: &str, max_depth: usize) -> Result<Value> {
    parse_group(text.trim(), 1, max_depth)
}

fn parse_group(text: &str, depth: usize, max_depth: usize) -> Result<Value> {
    let is_table = match text.chars().next() {
        Some('[') => false,
        Some('{') => true,
        _ => return Ok(Value::Scalar(unquote(text).to_string())),
    };

    if depth > max_depth {
        return Err(Error::new(
            ErrorKind::NestingTooDeep,
            format!("inline collections nested deeper than {}", max_depth),
        ));
    }

    let groups = scan::scan_any(text)?;
    let Some(outer) = groups.first() else {
        return Ok(Value::Scalar(text.to_string()));
    };
    if outer.end < text.len() {
        debug!(trailing = &text[outer.end..], "ignoring text after inline collection");
    }

    let inner = &outer.text[1..outer.text.len() - 1];
    let flat = Flattened::new(inner)?;

    let resolve = |piece: &str| -> Result<Value> {
        match flat.nested_group(piece) {
            Some(group) => parse_group(group, depth + 1, max_depth),
            None => Ok(Value::Scalar(unquote(&flat.restore(piece)).to_string())),
        }
    };

    let pieces = split_unquoted(&flat.text, ',')
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty());

    if is_table {
        let mut table = Table::new();
        for piece in pieces {
            let Some(at) = find_unquoted(piece, |c| c == '=' || c == ':') else {
                debug!(item = piece, "ignoring inline table item without a key");
                continue;
            };
            let key = flat.restore(&piece[..at]);
            let segments = key_segments(&key);
            if segments.is_empty() {
                continue;
            }
            let value = resolve(piece[at + 1..].trim())?;
            insert_path(&mut table, &segments, value);
        }
        Ok(Value::Table(table))
    } else {
        pieces
            .map(resolve)
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }
}

/// Collection text with every top-level nested group swapped for a
/// placeholder token.
struct Flattened<'a> {
    text: String,
    nested: Vec<&'a str>,
    mark: char,
}

impl<'a> Flattened<'a> {
    fn new(inner: &'a str) -> Result<Self> {
        let groups = scan::scan_any(inner)?;
        let mark = if groups.is_empty() {
            *MARKS.start()
        } else {
            MARKS
                .clone()
                .find(|c| !inner.contains(*c))
                .ok_or_else(|| Error::custom("no free placeholder character for inline collection"))?
        };

        let mut text = String::with_capacity(inner.len());
        let mut nested = Vec::new();
        let mut last = 0usize;
        for group in groups {
            text.push_str(&inner[last..group.start]);
            text.push(mark);
            text.push_str(&nested.len().to_string());
            text.push(mark);
            nested.push(group.text);
            last = group.end;
        }
        text.push_str(&inner[last..]);

        Ok(Flattened { text, nested, mark })
    }

    /// Returns the nested group a piece stands for, if the piece is exactly
    /// one placeholder.
    fn nested_group(&self, piece: &str) -> Option<&'a str> {
        let idx: usize = piece
            .trim()
            .strip_prefix(self.mark)?
            .strip_suffix(self.mark)?
            .parse()
            .ok()?;
        self.nested.get(idx).copied()
    }

    /// Puts the original text back in place of any placeholder inside a
    /// literal.
    fn restore(&self, piece: &str) -> String {
        if self.nested.is_empty() || !piece.contains(self.mark) {
            return piece.to_string();
        }

        let mut out = String::with_capacity(piece.len());
        let mut parts = piece.split(self.mark);
        if let Some(head) = parts.next() {
            out.push_str(head);
        }
        while let (Some(idx), Some(tail)) = (parts.next(), parts.next()) {
            match idx.parse::<usize>().ok().and_then(|i| self.nested.get(i)) {
                Some(original) => out.push_str(original),
                None => out.push_str(idx),
            }
            out.push_str(tail);
        }
        out
    }
}

/// Collects the lines of an inline collection that spans several lines.
#[derive(Debug, Clone)]
pub(crate) struct FlowBuffer {
    text: String,
    opened_at: usize,
}

impl FlowBuffer {
    pub(crate) fn new(first: &str, opened_at: usize) -> Self {
        FlowBuffer {
            text: first.trim().to_string(),
            opened_at,
        }
    }

    /// Appends a line. Returns the complete text once the brackets balance.
    pub(crate) fn push(&mut self, line: &str) -> Result<Option<String>> {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            return Ok(None);
        }
        self.text.push(' ');
        self.text.push_str(line);

        match scan::balance(&self.text) {
            0 => Ok(Some(std::mem::take(&mut self.text))),
            n if n < 0 => Err(Error::unbalanced('[').at_line(self.opened_at)),
            _ => Ok(None),
        }
    }

    /// Line the collection was opened on.
    pub(crate) fn opened_at(&self) -> usize {
        self.opened_at
    }

    /// Error for a collection still open at the end of input.
    pub(crate) fn unterminated(&self) -> Error {
        let close = match scan::scan_any(&self.text) {
            Err(err) => return err.at_line(self.opened_at),
            Ok(_) => ']',
        };
        Error::unbalanced(close).at_line(self.opened_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_table_with_nested_list() {
        let value = parse_flow(r#"{ name = "web", ports = [80, 443] }"#, 64).unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table["name"], Value::from("web"));
        assert_eq!(table["ports"], Value::from(vec!["80", "443"]));
    }

    #[test]
    fn inline_table_accepts_colon_pairs() {
        let value = parse_flow("{a: 1, url: http://x}", 64).unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table["a"], Value::from("1"));
        assert_eq!(table["url"], Value::from("http://x"));
    }

    #[test]
    fn dotted_keys_inside_inline_table() {
        let value = parse_flow("{a.b = 1}", 64).unwrap();
        assert_eq!(value.pointer("a.b"), Some(&Value::from("1")));
    }

    #[test]
    fn quoted_commas_stay_in_element() {
        let value = parse_flow(r#"["a,b", c]"#, 64).unwrap();
        assert_eq!(value, Value::from(vec!["a,b", "c"]));
    }

    #[test]
    fn empty_pieces_are_skipped() {
        assert_eq!(parse_flow("[]", 64).unwrap(), Value::List(vec![]));
        assert_eq!(parse_flow("[a,,b,]", 64).unwrap(), Value::from(vec!["a", "b"]));
    }

    #[test]
    fn placeholder_lookalikes_stay_literal() {
        let value = parse_flow("[\u{0}3\u{0}, \u{E000}7\u{E000}]", 64).unwrap();
        assert_eq!(value, Value::from(vec!["\u{0}3\u{0}", "\u{E000}7\u{E000}"]));

        let value = parse_flow("[\u{E000}0\u{E000}, [1]]", 64).unwrap();
        assert_eq!(
            value,
            Value::from(vec![Value::from("\u{E000}0\u{E000}"), Value::from(vec!["1"])])
        );
    }

    #[test]
    fn depth_limit() {
        let err = parse_flow("[[[1]]]", 2).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NestingTooDeep);
        assert!(parse_flow("[[[1]]]", 3).is_ok());
    }

    #[test]
    fn buffer_waits_for_balance() {
        let mut buffer = FlowBuffer::new("[", 3);
        assert_eq!(buffer.push("  1, # first").unwrap(), None);
        assert_eq!(buffer.push("  [2, 3],").unwrap(), None);
        let text = buffer.push("]").unwrap().unwrap();
        assert_eq!(
            parse_flow(&text, 64).unwrap(),
            Value::from(vec![Value::from("1"), Value::from(vec!["2", "3"])])
        );
    }
}
