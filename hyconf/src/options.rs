//! Configuration options for loading and decoding documents.

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;

/// Name of the section that holds keys declared before any header.
pub const DEFAULT_SECTION: &str = "default";

/// Line syntax used by the parser.
///
/// # Examples
///
/// ```
/// use hyconf::Syntax;
/// use std::path::Path;
///
/// assert_eq!(Syntax::from_path(Path::new("app.yml")), Syntax::Yaml);
/// assert_eq!(Syntax::from_path(Path::new("app.conf")), Syntax::Ini);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    /// INI sections with TOML tables, arrays-of-tables and multi-line strings.
    #[default]
    Ini,
    /// Indentation-based block maps and `- item` sequences.
    Yaml,
}

impl Syntax {
    /// Picks the syntax from a file extension. Unknown extensions are INI.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => Syntax::from_name(ext).unwrap_or_default(),
            None => Syntax::Ini,
        }
    }

    /// Parses a syntax name such as `yaml`, `yml`, `ini`, `conf` or `toml`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Syntax::Yaml),
            "ini" | "conf" | "cfg" | "toml" | "" => Some(Syntax::Ini),
            _ => None,
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Ini => write!(f, "ini"),
            Syntax::Yaml => write!(f, "yaml"),
        }
    }
}

/// Options for controlling how a document is parsed.
///
/// # Examples
///
/// ```
/// use hyconf::{LoadOptions, Syntax};
///
/// let opts = LoadOptions::new().with_syntax(Syntax::Yaml).with_max_depth(16);
/// assert_eq!(opts.syntax, Some(Syntax::Yaml));
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Line syntax. `None` picks it from the file extension on `load`, and
    /// falls back to [`Syntax::Ini`] for in-memory input.
    ///
    /// Default: `None`
    pub syntax: Option<Syntax>,

    /// Maximum nesting depth of inline `[...]`/`{...}` collections.
    ///
    /// Default: `64`
    pub max_depth: usize,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = Some(syntax);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            syntax: None,
            max_depth: 64,
        }
    }
}

/// Options for controlling how tree values are decoded into Rust types.
///
/// # Examples
///
/// ```
/// use hyconf::{DecodeOptions, Delimiter};
///
/// let opts = DecodeOptions::new().with_field_delimiter("hosts", Delimiter::Semicolon);
/// assert_eq!(opts.delimiter_for(Some("hosts")), Delimiter::Semicolon);
/// assert_eq!(opts.delimiter_for(Some("ports")), Delimiter::Comma);
/// ```
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Delimiter used to split a scalar into a sequence.
    ///
    /// Default: [`Delimiter::Comma`]
    pub delimiter: Delimiter,

    /// Per-field delimiter overrides, keyed by the field's lookup key.
    pub field_delimiters: IndexMap<String, Delimiter>,

    /// Fill fields that are absent from the tree with their zero value.
    ///
    /// When disabled, absent fields are left to serde (`#[serde(default)]`
    /// or `Option`).
    ///
    /// Default: `true`
    pub zero_missing: bool,

    /// Materialize absent `Option` fields as `Some` of their zero value, so
    /// an optional nested record gets an empty instance with every field
    /// zero-filled. An absent optional enum takes its first variant. Absent
    /// `Option` fields inside an allocated record stay `None`. Only applies
    /// while `zero_missing` is on.
    ///
    /// Default: `false`
    pub allocate_nested: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_field_delimiter(mut self, field: impl Into<String>, delimiter: Delimiter) -> Self {
        self.field_delimiters.insert(field.into(), delimiter);
        self
    }

    pub fn with_zero_missing(mut self, zero_missing: bool) -> Self {
        self.zero_missing = zero_missing;
        self
    }

    pub fn with_allocate_nested(mut self, allocate_nested: bool) -> Self {
        self.allocate_nested = allocate_nested;
        self
    }

    /// Returns the delimiter that applies to `field`.
    pub fn delimiter_for(&self, field: Option<&str>) -> Delimiter {
        field
            .and_then(|name| self.field_delimiters.get(name).copied())
            .unwrap_or(self.delimiter)
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            delimiter: Delimiter::Comma,
            field_delimiters: IndexMap::new(),
            zero_missing: true,
            allocate_nested: false,
        }
    }
}

/// Delimiter characters used to split scalar text into sequence elements.
///
/// # Examples
///
/// ```
/// use hyconf::Delimiter;
///
/// assert_eq!(Delimiter::Comma.as_char(), ',');
/// assert_eq!(Delimiter::Semicolon.as_char(), ';');
/// assert_eq!(Delimiter::Pipe.as_char(), '|');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// `a,b,c`
    #[default]
    Comma,
    /// `a;b;c`
    Semicolon,
    /// `a|b|c`
    Pipe,
    /// `a<TAB>b<TAB>c`
    Tab,
    /// `a b c`
    Space,
}

impl Delimiter {
    /// Returns the delimiter as a character.
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Pipe => '|',
            Delimiter::Tab => '\t',
            Delimiter::Space => ' ',
        }
    }

    /// Returns the delimiter for a character, if it is a supported one.
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            ',' => Some(Delimiter::Comma),
            ';' => Some(Delimiter::Semicolon),
            '|' => Some(Delimiter::Pipe),
            '\t' => Some(Delimiter::Tab),
            ' ' => Some(Delimiter::Space),
            _ => None,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Semicolon => write!(f, "semicolon"),
            Delimiter::Pipe => write!(f, "pipe"),
            Delimiter::Tab => write!(f, "tab"),
            Delimiter::Space => write!(f, "space"),
        }
    }
}
