use crate::tree::ParseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("invalid metavariable at offset {offset}: {message}")]
    MetaVariable { offset: usize, message: String },

    #[error("metavariable '{name}' is used both as ${name} and $$${name}")]
    KindConflict { name: String },

    #[error("pattern does not parse as {language}: syntax error at offset {offset} (line {line}, column {column})")]
    Syntax {
        language: String,
        offset: usize,
        line: usize,
        column: usize,
    },

    #[error("pattern must contain exactly one top-level node")]
    MultipleNodes,

    #[error("selector kind '{selector}' not found in pattern context")]
    SelectorNotFound { selector: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}
