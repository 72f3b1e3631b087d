//! Error taxonomy for the interpreter.
//!
//! One [`Error`] wraps a source name, a 1-based line number, and an
//! [`ErrorKind`] drawn from the lexical / syntactic / semantic / resource
//! taxonomy. Every error the interpreter can raise is reachable from here;
//! nothing propagates as a bare `String` or `&'static str`.

use thiserror::Error as ThisError;

/// An interpreter error, located at a source name and line.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
#[error("{source_name}:{line}: {kind}")]
pub struct Error {
    pub source_name: String,
    pub line: u32,
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(source_name: impl Into<String>, line: u32, kind: ErrorKind) -> Self {
        Error {
            source_name: source_name.into(),
            line,
            kind,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error kinds an interpreter context can raise, per the lexical /
/// syntactic / semantic / resource taxonomy.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // -- lexical --
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid number")]
    InvalidNumber,
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(char),

    // -- syntactic --
    #[error("invalid expression")]
    InvalidExpression,
    #[error("missing ';'")]
    MissingSemicolon,
    #[error("missing '}}'")]
    MissingBrace,
    #[error("expected property name")]
    ExpectedPropertyName,
    #[error("'{0}' expected")]
    Expected(char),
    #[error("invalid command definition '{0}'")]
    InvalidCommandDef(String),

    // -- semantic --
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("no variable {0}")]
    NoVariable(String),
    #[error("no such property '{0}'")]
    NoSuchProperty(String),
    #[error("not a variable")]
    NotLvalue,
    #[error("stack overflow")]
    StackOverflow,
    #[error("division overflow")]
    DivisionOverflow,
    #[error("invalid string operator '{0}'")]
    InvalidStringOperator(char),
    #[error("invalid numeric operator '{0}'")]
    InvalidNumericOperator(char),
    #[error("invalid function call")]
    InvalidFunctionCall,
    #[error("missing arguments for {0}")]
    MissingArguments(String),
    #[error("extra arguments for {0}")]
    ExtraArguments(String),
    #[error("read-only buffer")]
    ReadOnly,
    #[error("'{0}' failed: {1}")]
    CommandFailed(String, String),

    // -- resource --
    #[error("buffer too large")]
    BufferTooLarge,
    #[error("file too large")]
    FileTooLarge,
    #[error("I/O error: {0}")]
    Io(String),
}
