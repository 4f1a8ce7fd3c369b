//! Normalizer error types
//!
//! These never reach a viewer: any error means "no match" and the raw line
//! is broadcast instead.

use thiserror::Error;

/// Reasons a line could not be normalized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line produced no fields at all
    #[error("no fields found")]
    Empty,

    /// logfmt tokenizer hit a character it cannot accept
    #[error("unexpected {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    /// logfmt tokenizer failed inside a token (bad quote or escape)
    #[error("malformed token at offset {offset}")]
    MalformedToken { offset: usize },

    /// None of the access log layouts matched
    #[error("line does not match any {0} layout")]
    NoLayoutMatched(&'static str),

    /// A layout template did not compile
    #[error("invalid layout: {0}")]
    Layout(String),

    /// Structured output could not be encoded
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Encode(err.to_string())
    }
}

impl From<regex::Error> for ParseError {
    fn from(err: regex::Error) -> Self {
        ParseError::Layout(err.to_string())
    }
}

/// Result type for normalizer operations
pub type ParseResult<T> = Result<T, ParseError>;
