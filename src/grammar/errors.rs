use thiserror::Error;

/// A language identifier that no registered grammar answers to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported language '{name}'{}", did_you_mean(.suggestion))]
pub struct UnsupportedLanguageError {
    pub name: String,
    pub suggestion: Option<String>,
}

impl UnsupportedLanguageError {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

pub(crate) fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}
