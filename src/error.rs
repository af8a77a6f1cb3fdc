use crate::config::ConfigError;
use crate::grammar::UnsupportedLanguageError;
use crate::pattern::InvalidPatternError;
use crate::rule::InvalidRuleError;
use crate::search::PageError;
use crate::tree::ParseError;
use thiserror::Error;

/// Any failure of the public operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguageError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),

    #[error(transparent)]
    InvalidRule(#[from] InvalidRuleError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("failed to start search workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to serialise results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification used by callers that react per error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedLanguage,
    Parse,
    InvalidPattern,
    InvalidRule,
    Config,
    InvalidArgument,
    Io,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedLanguage(_) => ErrorKind::UnsupportedLanguage,
            Error::Parse(_) => ErrorKind::Parse,
            Error::InvalidPattern(_) => ErrorKind::InvalidPattern,
            Error::InvalidRule(_) => ErrorKind::InvalidRule,
            Error::Config(_) => ErrorKind::Config,
            Error::Page(_) => ErrorKind::InvalidArgument,
            Error::Io { .. } => ErrorKind::Io,
            Error::WorkerPool(_) | Error::Serialize(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
