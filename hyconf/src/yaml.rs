//! Line parser for indentation-based YAML documents.
//!
//! Supports block maps, `- item` sequences (including `- key: value` item
//! tables), flow collections and `|` / `>` block scalars. Everything is
//! written to the default section.

use crate::block::indent_of;
use crate::error::Result;
use crate::literal::{key_segments, strip_comment};
use crate::options::DEFAULT_SECTION;
use crate::parser::{parse_value, Parsed, Pending, Target};
use crate::scan::QuoteState;
use crate::tree::{PropertyTree, Step};
use crate::value::Value;
use tracing::debug;

/// An open block map or sequence.
#[derive(Debug, Clone)]
struct Frame {
    /// Indentation of the line that opened the frame; `-1` for the root.
    indent: isize,
    address: Vec<Step>,
    /// Opened by `key:` with no value, so `- item` lines may follow at the
    /// key's own indentation.
    accepts_items: bool,
}

pub(crate) struct YamlParser<'t> {
    tree: &'t mut PropertyTree,
    max_depth: usize,
    frames: Vec<Frame>,
    pending: Option<Pending>,
    line_number: usize,
}

impl<'t> YamlParser<'t> {
    pub(crate) fn new(tree: &'t mut PropertyTree, max_depth: usize) -> Self {
        YamlParser {
            tree,
            max_depth,
            frames: vec![Frame {
                indent: -1,
                address: Vec::new(),
                accepts_items: false,
            }],
            pending: None,
            line_number: 0,
        }
    }

    pub(crate) fn feed_line(&mut self, raw: &str) -> Result<()> {
        self.line_number += 1;

        if let Some(pending) = self.pending.take() {
            let resumed = pending.feed(raw, self.tree, self.max_depth)?;
            self.pending = resumed.pending;
            if !resumed.reprocess {
                return Ok(());
            }
        }

        self.parse_line(raw)
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.pending {
            Some(pending) => pending.finish(self.tree),
            None => Ok(()),
        }
    }

    fn parse_line(&mut self, raw: &str) -> Result<()> {
        let content = raw.trim();
        if content.is_empty()
            || content.starts_with('#')
            || content.starts_with('%')
            || content == "---"
            || content == "..."
            || content.starts_with("--- ")
        {
            return Ok(());
        }

        let indent = indent_of(raw);
        if content == "-" || content.starts_with("- ") {
            let rest = &content[1..];
            let offset = rest.len() - rest.trim_start().len();
            return self.item(indent, indent + 1 + offset, rest.trim_start());
        }

        self.pop_to(indent as isize, false);
        match split_key(content) {
            Some((key, value)) => {
                let parent = self.top().address.clone();
                self.key_value(indent, parent, key, value)
            }
            None => {
                debug!(line = self.line_number, text = content, "ignoring line without a key");
                Ok(())
            }
        }
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    fn pop_to(&mut self, indent: isize, for_item: bool) {
        while self.frames.len() > 1 {
            let top = self.top();
            let keep = top.indent < indent || (top.indent == indent && for_item && top.accepts_items);
            if keep {
                break;
            }
            self.frames.pop();
        }
    }

    fn key_value(&mut self, indent: usize, parent: Vec<Step>, key: &str, value: &str) -> Result<()> {
        let key = key_segments(key);
        if key.is_empty() {
            return Ok(());
        }

        if strip_comment(value).trim().is_empty() {
            let mut address = parent;
            address.extend(key.into_iter().map(Step::Key));
            self.tree.touch(DEFAULT_SECTION, &address);
            self.frames.push(Frame {
                indent: indent as isize,
                address,
                accepts_items: true,
            });
            return Ok(());
        }

        let target = Target::key(DEFAULT_SECTION, &parent, key);
        self.dispatch(target, value, indent)
    }

    /// Handles `- ...` at `indent`; `content_column` is where the item text
    /// starts.
    fn item(&mut self, indent: usize, content_column: usize, rest: &str) -> Result<()> {
        self.pop_to(indent as isize, true);
        let list = self.top().address.clone();
        if list.is_empty() {
            debug!(line = self.line_number, "ignoring sequence item at document root");
            return Ok(());
        }

        if strip_comment(rest).trim().is_empty() {
            self.tree.push_item(DEFAULT_SECTION, &list, Value::default());
            return Ok(());
        }

        if let Some((key, value)) = split_key(rest) {
            let index = self.tree.push_item(DEFAULT_SECTION, &list, Value::table());
            let mut address = list;
            address.push(Step::Index(index));
            self.frames.push(Frame {
                indent: indent as isize,
                address: address.clone(),
                accepts_items: false,
            });
            return self.key_value(content_column, address, key, value);
        }

        let target = Target::Item {
            section: DEFAULT_SECTION.to_string(),
            address: list,
        };
        self.dispatch(target, rest, indent)
    }

    fn dispatch(&mut self, target: Target, value: &str, indent: usize) -> Result<()> {
        match parse_value(value, indent, self.line_number, self.max_depth)? {
            Parsed::Value(value) => target.commit(self.tree, value),
            Parsed::Block(block) => {
                self.pending = Some(Pending::Block {
                    block,
                    target,
                    opened_at: self.line_number,
                })
            }
            Parsed::Flow(buffer) => self.pending = Some(Pending::Flow { buffer, target }),
        }
        Ok(())
    }
}

/// Splits `key: value` at the first unquoted `:` followed by whitespace or
/// the end of the line.
fn split_key(content: &str) -> Option<(&str, &str)> {
    if content.starts_with('[') || content.starts_with('{') {
        return None;
    }

    let mut quotes = QuoteState::default();
    let mut chars = content.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if quotes.step(ch) {
            continue;
        }
        if ch == '#' {
            return None;
        }
        if ch == ':' && chars.peek().is_none_or(|(_, next)| next.is_whitespace()) {
            return Some((&content[..i], &content[i + 1..]));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_key_needs_space_after_colon() {
        assert_eq!(split_key("url: http://x"), Some(("url", " http://x")));
        assert_eq!(split_key("key:"), Some(("key", "")));
        assert_eq!(split_key("http://x"), None);
        assert_eq!(split_key(r#""a: b": c"#), Some((r#""a: b""#, " c")));
    }

    #[test]
    fn nested_maps_follow_indentation() {
        let mut tree = PropertyTree::new();
        let mut parser = YamlParser::new(&mut tree, 64);
        for line in ["server:", "  http:", "    port: 80", "  name: web", "top: 1"] {
            parser.feed_line(line).unwrap();
        }
        parser.finish().unwrap();

        assert_eq!(tree.lookup(DEFAULT_SECTION, "server.http.port"), Some(Value::from("80")));
        assert_eq!(tree.lookup(DEFAULT_SECTION, "server.name"), Some(Value::from("web")));
        assert_eq!(tree.lookup(DEFAULT_SECTION, "top"), Some(Value::from("1")));
    }
}
