//! Error types for the interpreter.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a query can fail, from the first character to the last tuple.
///
/// Errors are surfaced to the host as-is: no partial results, no recovery
/// inside the evaluator. A failed query leaves the environment untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("lex error at {line}:{column}: {message}")]
    Lex {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("domain error: {0}")]
    Domain(String),

    /// A relational operator applied to ordered tuples, or take applied to a
    /// relation. Sort is the one-way door out of the relational world.
    #[error("{0}")]
    Boundary(String),

    #[error("load error: {0}")]
    Load(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
