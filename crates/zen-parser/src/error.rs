use std::fmt;

/// An `Error` type for operations performed in the lexer and the parser.
///
/// Errors get collected alongside the resulting AST when either the lexer or
/// the parser encounters lexical or syntactical problems. Neither component
/// ever aborts: check the error list before handing the tree to an
/// evaluator.
///
/// ## Example
/// ```rust
/// use zen_parser::{Lexer, Parser, Scopes};
///
/// let input = "set languages \"zen\", \"rust\"";
/// let mut scopes = Scopes::new();
/// let mut parser = Parser::new(Lexer::new(input));
/// let result = parser.parse(&mut scopes);
///
/// assert!(result.errors().is_empty());
/// ```
#[derive(thiserror::Error, PartialEq, Eq, Clone)]
#[error("{message}: `{data}` at {line}:{column}")]
pub struct Error {
    pub(crate) message: String,
    pub(crate) data: String,
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) is_limit: bool,
}

impl Error {
    /// Create a new instance of `Error`.
    pub fn new<S: Into<String>>(message: S, data: String) -> Self {
        Self {
            message: message.into(),
            data,
            line: 0,
            column: 0,
            is_limit: false,
        }
    }

    /// Create a new instance of `Error` located at a line and column.
    pub fn with_pos<S: Into<String>>(message: S, data: String, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            data,
            line,
            column,
            is_limit: false,
        }
    }

    /// Create a new instance of `Error` for a reached limit.
    pub fn limit<S: Into<String>>(message: S, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            data: String::new(),
            line,
            column,
            is_limit: true,
        }
    }

    /// Get a reference to the error's message.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    /// Get a reference to the error's data. This is usually the lexeme that
    /// `zen-parser` has found to be lexically or syntactically incorrect.
    pub fn data(&self) -> &str {
        self.data.as_ref()
    }

    /// The 1-based line the error begins on.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The 1-based column the error begins at.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Whether this error was caused by hitting a resource limit.
    pub fn is_limit(&self) -> bool {
        self.is_limit
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            write!(
                f,
                "ERROR@{}:{} {:?}",
                self.line, self.column, self.message
            )
        } else {
            write!(
                f,
                "ERROR@{}:{} {:?} {}",
                self.line, self.column, self.message, self.data
            )
        }
    }
}
