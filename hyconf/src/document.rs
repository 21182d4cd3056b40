//! A loaded configuration document and its accessors.

use crate::de::{decode_onto, decode_value, parse_bool, parse_float, parse_integer};
use crate::error::Result;
use crate::literal::key_segments;
use crate::options::{DecodeOptions, LoadOptions, Syntax, DEFAULT_SECTION};
use crate::parser::{parse_inline_value, parse_into};
use crate::ser::to_value;
use crate::tree::PropertyTree;
use crate::value::{Table, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// A parsed configuration document.
///
/// # Examples
///
/// ```
/// let doc = hyconf::from_str("name = app\n[db]\nport = 5432").unwrap();
///
/// assert_eq!(doc.get_string("name", None), "app");
/// assert_eq!(doc.get_int("port", Some("db")), 5432);
/// assert_eq!(doc.get_int("db.port", None), 5432);
/// assert_eq!(doc.get_int_or("timeout", Some("db"), 30), 30);
/// ```
#[derive(Debug)]
pub struct Document {
    tree: PropertyTree,
    syntax: Syntax,
    max_depth: usize,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Document {
            tree: PropertyTree::new(),
            syntax: Syntax::default(),
            max_depth: LoadOptions::default().max_depth,
        }
    }

    /// Parses `input`. The syntax defaults to INI when the options leave it
    /// open.
    pub fn parse(input: &str, options: &LoadOptions) -> Result<Self> {
        let syntax = options.syntax.unwrap_or_default();
        let mut tree = PropertyTree::new();
        parse_into(&mut tree, input, syntax, options.max_depth)?;
        Ok(Document {
            tree,
            syntax,
            max_depth: options.max_depth,
        })
    }

    /// Reads and parses everything from `reader`.
    pub fn read<R: Read>(mut reader: R, options: &LoadOptions) -> Result<Self> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Document::parse(&buf, options)
    }

    /// Reads and parses a file, picking the syntax from its extension unless
    /// the options name one.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let syntax = options.syntax.unwrap_or_else(|| Syntax::from_path(path));
        debug!(path = %path.display(), %syntax, "loading document");

        let input = fs::read_to_string(path)?;
        let options = LoadOptions {
            syntax: Some(syntax),
            ..options.clone()
        };
        Document::parse(&input, &options)
    }

    /// Syntax the document was parsed with.
    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn tree(&self) -> &PropertyTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut PropertyTree {
        &mut self.tree
    }

    /// Section names in declaration order, starting with the default section.
    pub fn sections(&self) -> Vec<String> {
        self.tree.section_names().map(str::to_string).collect()
    }

    /// Returns a copy of a whole section.
    pub fn get_section(&self, name: &str) -> Option<Table> {
        self.tree.snapshot(name)
    }

    /// Looks up a dotted key.
    ///
    /// With a section, the key is resolved inside that section. Without one,
    /// the default section is searched first; if the key is not there and its
    /// first segment names a section, the rest of the key is resolved inside
    /// that section (`db.port` finds `port` in `[db]`).
    ///
    /// Quoted segments may contain dots: `site."example.com"` is two segments.
    pub fn get(&self, key: &str, section: Option<&str>) -> Option<Value> {
        let key = key_segments(key);

        if let Some(section) = section.filter(|s| !s.is_empty()) {
            return self.tree.lookup_path(section, &key);
        }

        self.tree.lookup_path(DEFAULT_SECTION, &key).or_else(|| {
            let (head, rest) = key.split_first()?;
            if head == DEFAULT_SECTION {
                return None;
            }
            self.tree.lookup_path(head, rest)
        })
    }

    fn scalar(&self, key: &str, section: Option<&str>) -> Option<String> {
        match self.get(key, section)? {
            Value::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Scalar text at `key`, or `""`.
    pub fn get_string(&self, key: &str, section: Option<&str>) -> String {
        self.scalar(key, section).unwrap_or_default()
    }

    /// Scalar text at `key`, or `default` when it is missing or empty.
    pub fn get_string_or(&self, key: &str, section: Option<&str>, default: &str) -> String {
        self.scalar(key, section)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    /// Integer at `key`, or `0` when missing or not a number.
    pub fn get_int(&self, key: &str, section: Option<&str>) -> i64 {
        self.get_int_or(key, section, 0)
    }

    /// Integer at `key`, or `default` when missing, empty or not a number.
    pub fn get_int_or(&self, key: &str, section: Option<&str>, default: i64) -> i64 {
        self.scalar(key, section)
            .and_then(|text| parse_integer(&text))
            .map(|n| i64::try_from(n).unwrap_or(if n < 0 { i64::MIN } else { i64::MAX }))
            .unwrap_or(default)
    }

    /// Float at `key`, or `0.0` when missing or not a number.
    pub fn get_float(&self, key: &str, section: Option<&str>) -> f64 {
        self.get_float_or(key, section, 0.0)
    }

    /// Float at `key`, or `default` when missing, empty or not a number.
    pub fn get_float_or(&self, key: &str, section: Option<&str>, default: f64) -> f64 {
        self.scalar(key, section)
            .and_then(|text| parse_float(&text))
            .unwrap_or(default)
    }

    /// Boolean at `key`, or `false` when missing or not a boolean.
    pub fn get_bool(&self, key: &str, section: Option<&str>) -> bool {
        self.get_bool_or(key, section, false)
    }

    /// Boolean at `key`, or `default` when missing, empty or not a boolean.
    pub fn get_bool_or(&self, key: &str, section: Option<&str>, default: bool) -> bool {
        self.scalar(key, section)
            .and_then(|text| parse_bool(&text))
            .unwrap_or(default)
    }

    /// Writes `value` at a dotted key. Missing sections and tables are
    /// created.
    ///
    /// ```
    /// let mut doc = hyconf::Document::new();
    /// doc.set("pool.size", 8i64, Some("db"));
    /// assert_eq!(doc.get_int("pool.size", Some("db")), 8);
    /// ```
    pub fn set(&mut self, key: &str, value: impl Into<Value>, section: Option<&str>) {
        let section = section.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SECTION);
        let key = key_segments(key);
        self.tree.assign(section, &[], &key, value.into());
    }

    /// Parses `raw` as it would be parsed after `=` on a key line (flow
    /// collections, quotes, `${...}` references) and writes the result.
    pub fn set_parsed(&mut self, key: &str, raw: &str, section: Option<&str>) -> Result<()> {
        let value = parse_inline_value(raw, &self.tree, self.max_depth)?;
        self.set(key, value, section);
        Ok(())
    }

    /// Merges all sections into one table: default keys at the top level and
    /// every other section as a nested table.
    pub fn to_table(&self) -> Table {
        self.tree.merged()
    }

    /// Decodes the value at `key` into `target`.
    ///
    /// Struct fields the document does not mention keep their current value.
    /// A missing key leaves `target` untouched. An empty key with no section
    /// decodes the whole document.
    ///
    /// ```
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Serialize, Deserialize)]
    /// struct Server {
    ///     host: String,
    ///     port: u16,
    /// }
    ///
    /// let doc = hyconf::from_str("[server]\nhost = web").unwrap();
    /// let mut server = Server { host: "old".into(), port: 8080 };
    /// doc.decode("server", None, &mut server).unwrap();
    /// assert_eq!((server.host.as_str(), server.port), ("web", 8080));
    /// ```
    pub fn decode<T>(&self, key: &str, section: Option<&str>, target: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.decode_with_options(key, section, target, &DecodeOptions::default())
    }

    /// [`Document::decode`] with custom [`DecodeOptions`].
    pub fn decode_with_options<T>(
        &self,
        key: &str,
        section: Option<&str>,
        target: &mut T,
        options: &DecodeOptions,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        match self.lookup_for_decode(key, section) {
            Some(value) => {
                let base = to_value(&*target)?;
                *target = decode_onto(value, base, options)?;
                Ok(())
            }
            None => {
                debug!(key, section = section.unwrap_or(DEFAULT_SECTION), "nothing to decode");
                Ok(())
            }
        }
    }

    /// Decodes the value at `key`, or the zero value of `T` if it is missing.
    pub fn decode_as<T: DeserializeOwned>(&self, key: &str, section: Option<&str>) -> Result<T> {
        decode_value(self.lookup_for_decode(key, section), &DecodeOptions::default())
    }

    /// Decodes the whole document as one record.
    ///
    /// ```
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Server {
    ///     port: u16,
    /// }
    ///
    /// let doc = hyconf::from_str("[server]\nport = 8080").unwrap();
    /// let server: Server = doc.decode_root().unwrap();
    /// assert_eq!(server.port, 8080);
    /// ```
    pub fn decode_root<T: DeserializeOwned>(&self) -> Result<T> {
        self.decode_root_with_options(&DecodeOptions::default())
    }

    pub fn decode_root_with_options<T: DeserializeOwned>(&self, options: &DecodeOptions) -> Result<T> {
        decode_value(Some(Value::Table(self.to_table())), options)
    }

    fn lookup_for_decode(&self, key: &str, section: Option<&str>) -> Option<Value> {
        if key_segments(key).is_empty() && section.is_none_or(str::is_empty) {
            return Some(Value::Table(self.to_table()));
        }
        self.get(key, section)
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.tree.serialize(serializer)
    }
}
