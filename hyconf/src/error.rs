//! Error types for loading and decoding configuration documents.
//!
//! Structural problems found while parsing (unbalanced brackets, unreadable
//! files) abort a load and carry the offending line when it is known.
//! Value-level problems (a field that does not parse as a number) are never
//! errors: the decoder falls back to the zero value instead.

use std::fmt;

/// A specialized `Result` type for hyconf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for hyconf operations.
///
/// Errors include a specific kind, a descriptive message, and optional line/column
/// location information for parse errors.
///
/// # Examples
///
/// ```
/// use hyconf::{from_str, ErrorKind};
///
/// let err = from_str("ports = [80, [443]").unwrap_err();
/// assert!(matches!(err.kind(), ErrorKind::UnbalancedDelimiter));
/// assert_eq!(err.line(), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    line: Option<usize>,
    column: Option<usize>,
}

/// Specific kinds of errors that can occur during hyconf operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A `[`/`]` or `{`/`}` pair does not balance.
    ///
    /// # Example
    /// ```text
    /// hosts = [a, [b, c]    // UnbalancedDelimiter: one `]` missing
    /// ```
    UnbalancedDelimiter,
    /// Flow collections are nested deeper than `LoadOptions::max_depth`.
    NestingTooDeep,
    /// The decode target cannot receive the value found in the tree.
    InvalidTargetShape,
    /// A key required by the target is absent and has no zero value.
    MissingKey,
    /// An I/O error occurred while reading the document.
    Io(String),
    /// A custom error message.
    Custom(String),
}

impl Error {
    /// Creates a new error with the specified kind and message.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyconf::error::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::NestingTooDeep, "too many nested lists");
    /// let _ = err.kind();
    /// ```
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Adds location information to this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyconf::error::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::UnbalancedDelimiter, "missing ']'")
    ///     .with_location(5, 12);
    ///
    /// let msg = format!("{}", err);
    /// assert!(msg.contains("line 5"));
    /// assert!(msg.contains("column 12"));
    /// ```
    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a line number, keeping any location that is already set.
    pub(crate) fn at_line(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
            self.column = Some(1);
        }
        self
    }

    /// Creates a custom error with a free-form message.
    pub fn custom(msg: impl Into<String>) -> Self {
        let message = msg.into();
        Error::new(ErrorKind::Custom(message.clone()), message)
    }

    pub(crate) fn unbalanced(symbol: char) -> Self {
        Error::new(
            ErrorKind::UnbalancedDelimiter,
            format!("'{}' symbol mismatch", symbol),
        )
    }

    pub(crate) fn invalid_target(expected: &str, found: &str) -> Self {
        Error::new(
            ErrorKind::InvalidTargetShape,
            format!("cannot decode {} into {}", found, expected),
        )
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the 1-based line the error was detected on, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "{} at line {}, column {}", self.message, line, col)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for Error {}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(err.to_string()), err.to_string())
    }
}
