use crate::grammar::errors::did_you_mean;
use crate::pattern::InvalidPatternError;
use thiserror::Error;

/// A rule document that cannot be compiled.
///
/// `path` locates the offending value inside the document, e.g.
/// `rule.all[1].inside.stopBy`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRuleError {
    #[error("malformed rule document: {message}")]
    Syntax { message: String },

    #[error("rule document has no 'language'")]
    MissingLanguage,

    #[error("rule is written for '{rule}' but '{requested}' was requested")]
    LanguageMismatch { rule: String, requested: String },

    #[error("{path}: rule object has no keys")]
    EmptyRule { path: String },

    #[error("{path}: '{key}' needs at least one rule")]
    EmptyList { path: String, key: &'static str },

    #[error("{path}: '{key}' is only allowed inside inside/has/precedes/follows")]
    RelationOnly { path: String, key: &'static str },

    #[error("{path}: 'field' cannot be used with '{relation}'")]
    FieldNotAllowed { path: String, relation: &'static str },

    #[error("{path}: unknown node kind '{kind}' for {language}{}", did_you_mean(.suggestion))]
    UnknownKind {
        path: String,
        kind: String,
        language: String,
        suggestion: Option<String>,
    },

    #[error("{path}: unknown field '{field}' for {language}")]
    UnknownField {
        path: String,
        field: String,
        language: String,
    },

    #[error("{path}: invalid regex: {message}")]
    Regex { path: String, message: String },

    #[error("{path}: {source}")]
    Pattern {
        path: String,
        #[source]
        source: InvalidPatternError,
    },

    #[error("{path}: no utility rule named '{id}'")]
    UnknownUtil { path: String, id: String },

    #[error("{path}: utility rules form a cycle: {cycle}")]
    UtilCycle { path: String, cycle: String },
}

impl InvalidRuleError {
    /// Location inside the document, when the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            InvalidRuleError::Syntax { .. }
            | InvalidRuleError::MissingLanguage
            | InvalidRuleError::LanguageMismatch { .. } => None,
            InvalidRuleError::EmptyRule { path }
            | InvalidRuleError::EmptyList { path, .. }
            | InvalidRuleError::RelationOnly { path, .. }
            | InvalidRuleError::FieldNotAllowed { path, .. }
            | InvalidRuleError::UnknownKind { path, .. }
            | InvalidRuleError::UnknownField { path, .. }
            | InvalidRuleError::Regex { path, .. }
            | InvalidRuleError::Pattern { path, .. }
            | InvalidRuleError::UnknownUtil { path, .. }
            | InvalidRuleError::UtilCycle { path, .. } => Some(path),
        }
    }
}

impl From<serde_yaml::Error> for InvalidRuleError {
    fn from(err: serde_yaml::Error) -> Self {
        InvalidRuleError::Syntax {
            message: err.to_string(),
        }
    }
}
