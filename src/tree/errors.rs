use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("failed to set {language} grammar on the parser")]
    LanguageSet { language: String },

    #[error("parser produced no tree for {language} source")]
    Aborted { language: String },

    #[error("{language} syntax error at byte {offset} (line {line}, column {column})")]
    Syntax {
        language: String,
        offset: usize,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    /// Byte offset of the offending input, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { offset, .. } => Some(*offset),
            ParseError::Aborted { .. } => Some(0),
            ParseError::LanguageSet { .. } => None,
        }
    }
}
