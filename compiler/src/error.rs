use mprot_schema::ErrorList;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a compilation as a whole.
///
/// Problems inside schema files are collected in an [`ErrorList`] instead;
/// `Schema` only wraps such a list once the caller asks for a fully valid
/// schema.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Glob(String),

    #[error("{0}")]
    Schema(ErrorList),
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Lexical errors. They travel inside `Invalid` tokens and never stop the
/// tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("invalid octal number")]
    InvalidOctNumber,

    #[error("invalid hexadecimal number")]
    InvalidHexNumber,

    #[error("invalid floating-point number")]
    InvalidFloatNumber,

    #[error("invalid number")]
    InvalidNumber,

    #[error("string not terminated")]
    StringNotTerminated,

    #[error("comment not terminated")]
    CommentNotTerminated,

    #[error("invalid escape sequence")]
    InvalidEscapeSequence,

    #[error("invalid character nul")]
    NullChar,

    #[error("invalid encoding")]
    InvalidEncoding,

    #[error("buffer overflow")]
    BufferOverflow,

    #[error("invalid byte order mark")]
    InvalidBom,

    /// The offending character, already formatted (`'#'` or `U+0007`).
    #[error("invalid token {0}")]
    InvalidToken(String),
}
