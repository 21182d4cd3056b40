//! Hybrid configuration parser for INI, TOML-flavoured and YAML-style files.
//!
//! One parser reads the configuration dialects that tend to appear side by
//! side in real projects, and builds a single tree of named sections:
//!
//! - INI sections (`[db]`), with `[child:parent]` inheritance
//! - TOML dotted tables (`[server.tls]`), arrays of tables (`[[servers]]`),
//!   dotted keys and triple-quoted strings
//! - YAML block maps, `- item` sequences and `|` / `>` block scalars
//! - inline `[...]` and `{...}` collections nested to any depth
//! - `${section:key}` references to earlier values
//!
//! Values are kept as text. Typed accessors and the serde-based decoder
//! coerce them on the way out.
//!
//! # Usage
//!
//! ## Reading values
//!
//! ```
//! let doc = hyconf::from_str(
//!     "name = app\n\
//!      [db]\n\
//!      host = localhost\n\
//!      port = 5432\n\
//!      replicas = [10.0.0.2, 10.0.0.3]\n",
//! )
//! .unwrap();
//!
//! assert_eq!(doc.get_string("name", None), "app");
//! assert_eq!(doc.get_int("port", Some("db")), 5432);
//! assert_eq!(doc.get_string("db.host", None), "localhost");
//! assert!(doc.get("replicas", Some("db")).unwrap().is_list());
//! ```
//!
//! ## Decoding into structs
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Serialize, Debug, PartialEq)]
//! struct Database {
//!     host: String,
//!     port: u16,
//!     replicas: Vec<String>,
//!     pooled: bool,
//! }
//!
//! let doc = hyconf::from_str(
//!     "[db]\nhost = localhost\nport = 5432\nreplicas = a, b\npooled = yes\n",
//! )
//! .unwrap();
//!
//! let mut db = Database { host: String::new(), port: 0, replicas: vec![], pooled: false };
//! doc.decode("db", None, &mut db).unwrap();
//! assert_eq!(db.replicas, vec!["a", "b"]);
//! assert!(db.pooled);
//! ```
//!
//! ## YAML
//!
//! ```
//! use hyconf::{LoadOptions, Syntax};
//!
//! let yaml = "server:\n  ports:\n    - 80\n    - 443\n";
//! let doc = hyconf::from_str_with_options(yaml, &LoadOptions::new().with_syntax(Syntax::Yaml)).unwrap();
//! assert_eq!(doc.get_int("server.ports.1", None), 443);
//! ```
//!
//! # Error Handling
//!
//! Only structural problems are errors. Unbalanced brackets carry the line
//! the collection was opened on:
//!
//! ```
//! let err = hyconf::from_str("a = 1\nhosts = [x, y\n").unwrap_err();
//! assert_eq!(err.line(), Some(2));
//! ```

pub mod block;
pub mod de;
pub mod document;
pub mod error;
pub mod flow;
mod interp;
pub mod literal;
pub mod options;
mod parser;
pub mod scan;
pub mod ser;
pub mod tables;
pub mod tree;
pub mod value;
mod yaml;

use std::io::Read;
use std::path::Path;

pub use de::{from_value, from_value_with_options};
pub use document::Document;
pub use error::{Error, ErrorKind, Result};
pub use ser::to_value;
pub use options::{DecodeOptions, Delimiter, LoadOptions, Syntax, DEFAULT_SECTION};
pub use tree::{PropertyTree, SharedTable, Step};
pub use value::{Map, Table, Value};

/// Parses an INI-syntax document from a string.
pub fn from_str(input: &str) -> Result<Document> {
    from_str_with_options(input, &LoadOptions::default())
}

/// Parses a document from a string with the given syntax and limits.
///
/// When `options.syntax` is `None` the text is read as INI.
pub fn from_str_with_options(input: &str, options: &LoadOptions) -> Result<Document> {
    Document::parse(input, options)
}

/// Parses an INI-syntax document from a reader.
pub fn from_reader<R: Read>(reader: R) -> Result<Document> {
    from_reader_with_options(reader, &LoadOptions::default())
}

/// Parses a document from a reader with the given syntax and limits.
///
/// The whole input is read before parsing starts.
pub fn from_reader_with_options<R: Read>(reader: R, options: &LoadOptions) -> Result<Document> {
    Document::read(reader, options)
}

/// Loads a file, choosing YAML or INI syntax from its extension.
pub fn load(path: impl AsRef<Path>) -> Result<Document> {
    load_with_options(path, &LoadOptions::default())
}

/// Loads a file with the given options.
///
/// An explicit `options.syntax` wins over the file extension.
pub fn load_with_options(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Document> {
    Document::load(path, options)
}
