//! Line parser for INI documents with TOML extensions.
//!
//! Lines are handled one at a time against a small amount of state: the
//! current section, the address of the current table inside it, the open
//! array-of-tables root, and any multi-line value still being collected.

use crate::block::{indent_of, BlockScalar, BlockStyle, Feed, Terminator};
use crate::error::Result;
use crate::flow::{parse_flow, FlowBuffer};
use crate::interp::interpolate;
use crate::literal::{key_segments, normalize_path, parse_literal, strip_comment};
use crate::options::{Syntax, DEFAULT_SECTION};
use crate::scan::{self, find_unquoted};
use crate::tables::TableIndexer;
use crate::tree::{PropertyTree, Step};
use crate::value::Value;
use crate::yaml::YamlParser;
use tracing::{debug, trace};

/// Parses `input` into `tree` using the given line syntax.
pub(crate) fn parse_into(tree: &mut PropertyTree, input: &str, syntax: Syntax, max_depth: usize) -> Result<()> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    debug!(%syntax, bytes = input.len(), "parsing document");

    match syntax {
        Syntax::Ini => {
            let mut parser = IniParser::new(tree, max_depth);
            for line in input.lines() {
                parser.feed_line(line)?;
            }
            parser.finish()
        }
        Syntax::Yaml => {
            let mut parser = YamlParser::new(tree, max_depth);
            for line in input.lines() {
                parser.feed_line(line)?;
            }
            parser.finish()
        }
    }
}

/// Where a parsed value is written.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    /// Under a (possibly dotted) key of the table at `address`.
    Key {
        section: String,
        address: Vec<Step>,
        key: Vec<String>,
    },
    /// Appended to the list at `address`.
    Item { section: String, address: Vec<Step> },
}

impl Target {
    pub(crate) fn key(section: &str, address: &[Step], key: Vec<String>) -> Self {
        Target::Key {
            section: section.to_string(),
            address: address.to_vec(),
            key,
        }
    }

    /// Resolves references in `value` and writes it to the tree.
    pub(crate) fn commit(self, tree: &mut PropertyTree, value: Value) {
        let value = interpolate(value, tree);
        match self {
            Target::Key { section, address, key } => {
                trace!(section = %section, key = %key.join("."), "assign");
                tree.assign(&section, &address, &key, value);
            }
            Target::Item { section, address } => {
                tree.push_item(&section, &address, value);
            }
        }
    }
}

/// A value spanning several lines, waiting for its end.
#[derive(Debug)]
pub(crate) enum Pending {
    Block {
        block: BlockScalar,
        target: Target,
        opened_at: usize,
    },
    Flow { buffer: FlowBuffer, target: Target },
}

/// Outcome of feeding a line to a pending value.
pub(crate) struct Resumed {
    /// The value is still open.
    pub(crate) pending: Option<Pending>,
    /// The line was not part of the value and must be parsed normally.
    pub(crate) reprocess: bool,
}

impl Pending {
    pub(crate) fn feed(self, line: &str, tree: &mut PropertyTree, max_depth: usize) -> Result<Resumed> {
        match self {
            Pending::Block {
                mut block,
                target,
                opened_at,
            } => match block.feed(line) {
                Feed::Continue => Ok(Resumed {
                    pending: Some(Pending::Block {
                        block,
                        target,
                        opened_at,
                    }),
                    reprocess: false,
                }),
                feed => {
                    target.commit(tree, Value::Scalar(block.finish()));
                    Ok(Resumed {
                        pending: None,
                        reprocess: feed == Feed::Ended,
                    })
                }
            },
            Pending::Flow { mut buffer, target } => match buffer.push(line)? {
                Some(text) => {
                    let value = parse_flow(&text, max_depth).map_err(|e| e.at_line(buffer.opened_at()))?;
                    target.commit(tree, value);
                    Ok(Resumed {
                        pending: None,
                        reprocess: false,
                    })
                }
                None => Ok(Resumed {
                    pending: Some(Pending::Flow { buffer, target }),
                    reprocess: false,
                }),
            },
        }
    }

    /// Closes the value at the end of input.
    pub(crate) fn finish(self, tree: &mut PropertyTree) -> Result<()> {
        match self {
            Pending::Block {
                block,
                target,
                opened_at,
            } => {
                target.commit(tree, Value::Scalar(block.finish_at_eof(opened_at)));
                Ok(())
            }
            Pending::Flow { buffer, .. } => Err(buffer.unterminated()),
        }
    }
}

/// A value read from the text after `=` (or `:` in YAML).
#[derive(Debug)]
pub(crate) enum Parsed {
    Value(Value),
    Block(BlockScalar),
    Flow(FlowBuffer),
}

/// Parses the value part of a key line.
///
/// `key_indent` is the indentation of the key, which ends `|`/`>` blocks.
pub(crate) fn parse_value(raw: &str, key_indent: usize, line: usize, max_depth: usize) -> Result<Parsed> {
    let trimmed = raw.trim();

    if let Some(terminator) = Terminator::triple_quote(trimmed) {
        let delimiter = terminator.delimiter();
        let rest = &trimmed[delimiter.len()..];
        return Ok(match rest.find(delimiter) {
            Some(end) => Parsed::Value(Value::Scalar(rest[..end].to_string())),
            None => Parsed::Block(BlockScalar::quoted(terminator, rest)),
        });
    }

    let text = strip_comment(trimmed).trim();
    if let Some(style) = BlockStyle::from_indicator(text) {
        return Ok(Parsed::Block(BlockScalar::new(Terminator::Dedent { key_indent, style })));
    }

    if text.starts_with('[') || text.starts_with('{') {
        if scan::balance(text) > 0 {
            return Ok(Parsed::Flow(FlowBuffer::new(text, line)));
        }
        return parse_flow(text, max_depth)
            .map(Parsed::Value)
            .map_err(|e| e.at_line(line));
    }

    Ok(Parsed::Value(Value::Scalar(parse_literal(trimmed))))
}

/// Parses a single-line value as it would appear after `=`.
pub(crate) fn parse_inline_value(raw: &str, tree: &PropertyTree, max_depth: usize) -> Result<Value> {
    let value = match parse_value(raw, 0, 1, max_depth)? {
        Parsed::Value(value) => value,
        Parsed::Block(block) => Value::Scalar(block.finish()),
        Parsed::Flow(buffer) => return Err(buffer.unterminated()),
    };
    Ok(interpolate(value, tree))
}

/// Parser for INI section documents with TOML tables and strings.
pub(crate) struct IniParser<'t> {
    tree: &'t mut PropertyTree,
    max_depth: usize,
    section: String,
    address: Vec<Step>,
    array_root: Option<String>,
    indexer: TableIndexer,
    pending: Option<Pending>,
    line_number: usize,
}

impl<'t> IniParser<'t> {
    pub(crate) fn new(tree: &'t mut PropertyTree, max_depth: usize) -> Self {
        IniParser {
            tree,
            max_depth,
            section: DEFAULT_SECTION.to_string(),
            address: Vec::new(),
            array_root: None,
            indexer: TableIndexer::default(),
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
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            return Ok(());
        }

        if line.starts_with('[') {
            self.header(strip_comment(line).trim());
            return Ok(());
        }

        match find_unquoted(line, |c| c == '=') {
            Some(at) => self.key_value(&line[..at], &line[at + 1..], indent_of(raw)),
            None => {
                debug!(line = self.line_number, text = line, "ignoring line without '='");
                Ok(())
            }
        }
    }

    fn header(&mut self, header: &str) {
        if let Some(inner) = header.strip_prefix("[[").and_then(|h| h.strip_suffix("]]")) {
            self.array_header(inner);
            return;
        }

        let Some(inner) = header.strip_prefix('[').and_then(|h| h.strip_suffix(']')) else {
            debug!(line = self.line_number, text = header, "ignoring malformed header");
            return;
        };

        if let Some((child, parent)) = inner.split_once(':') {
            self.inherit_header(&normalize_path(child), &normalize_path(parent));
            return;
        }

        let path = key_segments(inner);
        let Some(root) = path.first() else {
            debug!(line = self.line_number, "ignoring empty header");
            return;
        };

        if self.array_root.as_deref() == Some(root.as_str()) {
            self.address = self.tree.open_sub_table(DEFAULT_SECTION, &path);
            self.section = DEFAULT_SECTION.to_string();
            debug!(line = self.line_number, table = %path.join("."), "sub-table of array element");
            return;
        }

        self.array_root = None;
        self.section = root.clone();
        self.address = path[1..].iter().cloned().map(Step::Key).collect();
        self.tree.touch(&self.section, &self.address);
        debug!(line = self.line_number, section = %self.section, depth = self.address.len(), "section");
    }

    fn inherit_header(&mut self, child: &str, parent: &str) {
        if child.is_empty() || child == parent {
            debug!(
                line = self.line_number,
                child,
                parent,
                "ignoring inheritance header without a distinct child name"
            );
            return;
        }

        self.array_root = None;
        if !self.tree.alias(child, parent) {
            self.tree.ensure_section(child);
        }
        self.section = child.to_string();
        self.address.clear();
    }

    fn array_header(&mut self, inner: &str) {
        let path = key_segments(inner);
        let Some(root) = path.first().cloned() else {
            debug!(line = self.line_number, "ignoring empty array-of-tables header");
            return;
        };

        let counters = self.indexer.advance(&path);
        self.address = self.tree.open_array_table(DEFAULT_SECTION, &path, &counters);
        self.section = DEFAULT_SECTION.to_string();
        debug!(
            line = self.line_number,
            table = %path.join("."),
            counters = %self.indexer.dotted(&root).unwrap_or_default(),
            "array of tables element"
        );
        self.array_root = Some(root);
    }

    fn key_value(&mut self, key: &str, value: &str, key_indent: usize) -> Result<()> {
        let key = key_segments(key);
        if key.is_empty() {
            debug!(line = self.line_number, "ignoring line with empty key");
            return Ok(());
        }

        let target = Target::key(&self.section, &self.address, key);
        match parse_value(value, key_indent, self.line_number, self.max_depth)? {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> PropertyTree {
        let mut tree = PropertyTree::new();
        parse_into(&mut tree, input, Syntax::Ini, 64).unwrap();
        tree
    }

    #[test]
    fn sections_and_default_keys() {
        let tree = parse("name = app\n[db]\nport = 5432 ; pg\n");
        assert_eq!(tree.lookup(DEFAULT_SECTION, "name"), Some(Value::from("app")));
        assert_eq!(tree.lookup("db", "port"), Some(Value::from("5432")));
    }

    #[test]
    fn dotted_header_nests_inside_section() {
        let tree = parse("[server.tls]\ncert = a.pem\n");
        assert_eq!(tree.lookup("server", "tls.cert"), Some(Value::from("a.pem")));
    }

    #[test]
    fn reopened_section_keeps_keys() {
        let tree = parse("[a]\nx = 1\n[b]\n[a]\ny = 2\n");
        assert_eq!(tree.lookup("a", "x"), Some(Value::from("1")));
        assert_eq!(tree.lookup("a", "y"), Some(Value::from("2")));
    }

    #[test]
    fn self_inheritance_header_is_ignored() {
        let tree = parse("[a]\nx = 1\n[b:b]\ny = 2\n");
        assert!(!tree.contains_section("b"));
        assert_eq!(tree.lookup("a", "y"), Some(Value::from("2")));
    }

    #[test]
    fn inheritance_header_without_child_is_ignored() {
        let tree = parse("[x]\nk = 1\n[a]\n[:x]\ny = 2\n");
        assert!(!tree.contains_section(""));
        assert_eq!(tree.lookup("a", "y"), Some(Value::from("2")));
        assert_eq!(tree.lookup("x", "y"), None);
    }

    #[test]
    fn block_ends_on_dedent_and_line_is_reparsed() {
        let tree = parse("text = |\n  one\n  two\nnext = 3\n");
        assert_eq!(tree.lookup(DEFAULT_SECTION, "text"), Some(Value::from("one\ntwo")));
        assert_eq!(tree.lookup(DEFAULT_SECTION, "next"), Some(Value::from("3")));
    }

    #[test]
    fn same_line_triple_quotes() {
        let tree = parse(r#"s = """abc""""#);
        assert_eq!(tree.lookup(DEFAULT_SECTION, "s"), Some(Value::from("abc")));
    }

    #[test]
    fn inline_value_parsing() {
        let tree = PropertyTree::new();
        assert_eq!(parse_inline_value("[1, 2]", &tree, 64).unwrap(), Value::from(vec!["1", "2"]));
        assert!(parse_inline_value("[1, 2", &tree, 64).is_err());
    }
}
