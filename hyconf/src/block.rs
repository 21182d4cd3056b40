//! Multi-line scalars: TOML triple-quoted strings and YAML `|` / `>` blocks.

use tracing::warn;

/// How an indented block joins its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// `|`: lines joined with newlines, indentation past the block's own kept.
    Literal,
    /// `>`: trimmed lines joined with single spaces.
    Folded,
}

impl BlockStyle {
    /// Recognizes a block indicator value (`|`, `>`, with an optional
    /// chomping suffix `-` or `+`).
    pub fn from_indicator(value: &str) -> Option<Self> {
        match value.trim() {
            "|" | "|-" | "|+" => Some(BlockStyle::Literal),
            ">" | ">-" | ">+" => Some(BlockStyle::Folded),
            _ => None,
        }
    }
}

/// What ends a multi-line scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// A line ending with `"""`. A trailing `\` joins the next line.
    TripleDouble,
    /// A line ending with `'''`.
    TripleSingle,
    /// The first non-blank line indented at or left of the opening key.
    Dedent { key_indent: usize, style: BlockStyle },
}

impl Terminator {
    /// Returns the triple-quote terminator that `value` starts with.
    pub fn triple_quote(value: &str) -> Option<Self> {
        if value.starts_with(r#"""""#) {
            Some(Terminator::TripleDouble)
        } else if value.starts_with("'''") {
            Some(Terminator::TripleSingle)
        } else {
            None
        }
    }

    pub fn delimiter(&self) -> &'static str {
        match self {
            Terminator::TripleDouble => r#"""""#,
            Terminator::TripleSingle => "'''",
            Terminator::Dedent { .. } => "",
        }
    }
}

/// Result of feeding one line to an open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// The line was consumed and the block is still open.
    Continue,
    /// The line closed the block.
    Done,
    /// The line belongs to the surrounding document; the block ended before it.
    Ended,
}

/// Accumulates the lines of a multi-line scalar until its terminator.
///
/// # Examples
///
/// ```
/// use hyconf::block::{BlockScalar, BlockStyle, Feed, Terminator};
///
/// let mut block = BlockScalar::new(Terminator::Dedent { key_indent: 0, style: BlockStyle::Folded });
/// assert_eq!(block.feed("  one"), Feed::Continue);
/// assert_eq!(block.feed("  two"), Feed::Continue);
/// assert_eq!(block.feed("next: 1"), Feed::Ended);
/// assert_eq!(block.finish(), "one two");
/// ```
#[derive(Debug, Clone)]
pub struct BlockScalar {
    terminator: Terminator,
    lines: Vec<String>,
    join_next: bool,
    block_indent: Option<usize>,
}

impl BlockScalar {
    pub fn new(terminator: Terminator) -> Self {
        BlockScalar {
            terminator,
            lines: Vec::new(),
            join_next: false,
            block_indent: None,
        }
    }

    /// Opens a triple-quoted string with the text that followed the opening
    /// quotes on the key line.
    pub fn quoted(terminator: Terminator, first: &str) -> Self {
        let mut block = BlockScalar::new(terminator);
        if !first.is_empty() {
            block.push_quoted(first);
        }
        block
    }

    /// Feeds the next raw line.
    pub fn feed(&mut self, line: &str) -> Feed {
        match self.terminator {
            Terminator::Dedent { key_indent, style } => self.feed_indented(line, key_indent, style),
            quoted => {
                let delimiter = quoted.delimiter();
                let trimmed = line.trim_end();
                if let Some(body) = trimmed.strip_suffix(delimiter) {
                    self.push_quoted(body);
                    Feed::Done
                } else {
                    self.push_quoted(line);
                    Feed::Continue
                }
            }
        }
    }

    fn push_quoted(&mut self, text: &str) {
        let joining = std::mem::take(&mut self.join_next) && !self.lines.is_empty();
        let text = if joining { text.trim_start() } else { text };
        let (chunk, continues) = match self.continuation(text) {
            Some(head) => (head, true),
            None => (text, false),
        };
        self.join_next = continues;

        match self.lines.last_mut() {
            Some(last) if joining => last.push_str(chunk),
            _ => self.lines.push(chunk.to_string()),
        }
    }

    /// In `"""` strings a line ending with `\` continues on the next line.
    fn continuation<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.terminator != Terminator::TripleDouble {
            return None;
        }
        text.trim_end().strip_suffix('\\')
    }

    fn feed_indented(&mut self, line: &str, key_indent: usize, style: BlockStyle) -> Feed {
        if line.trim().is_empty() {
            if style == BlockStyle::Literal && self.block_indent.is_some() {
                self.lines.push(String::new());
            }
            return Feed::Continue;
        }

        let indent = indent_of(line);
        if indent <= key_indent {
            return Feed::Ended;
        }

        match style {
            BlockStyle::Literal => {
                let block_indent = *self.block_indent.get_or_insert(indent);
                let strip = indent.min(block_indent);
                self.lines.push(line[strip..].trim_end().to_string());
            }
            BlockStyle::Folded => {
                self.block_indent.get_or_insert(indent);
                self.lines.push(line.trim().to_string());
            }
        }
        Feed::Continue
    }

    /// Whether the block waits for a closing quote rather than a dedent.
    pub fn is_quoted(&self) -> bool {
        !matches!(self.terminator, Terminator::Dedent { .. })
    }

    /// Returns the accumulated text.
    pub fn finish(mut self) -> String {
        match self.terminator {
            Terminator::Dedent { style: BlockStyle::Folded, .. } => self.lines.join(" "),
            Terminator::Dedent { style: BlockStyle::Literal, .. } => {
                while self.lines.last().is_some_and(|line| line.is_empty()) {
                    self.lines.pop();
                }
                self.lines.join("\n")
            }
            _ => self.lines.join("\n"),
        }
    }

    /// Flushes a block cut short by the end of input.
    pub fn finish_at_eof(self, opened_at: usize) -> String {
        if self.is_quoted() {
            warn!(
                line = opened_at,
                delimiter = self.terminator.delimiter(),
                "multi-line string not closed before end of input"
            );
        }
        self.finish()
    }
}

/// Width of the leading whitespace of `line`, in bytes.
pub(crate) fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}
