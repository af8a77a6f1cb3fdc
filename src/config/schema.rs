use crate::grammar::{GrammarRegistry, Language};
use glob::Pattern;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Project configuration (`sgconfig.yaml`).
///
/// ```yaml
/// languageGlobs:
///   tsx: ["*.ts"]
/// ignore:
///   - "vendor/**"
/// threads: 4
/// ```
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Language overrides by glob, checked before file extensions.
    #[serde(default)]
    pub language_globs: BTreeMap<String, Vec<String>>,
    /// Globs of paths (relative to the search root) to skip.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Worker threads for multi-file search; 0 picks one per core.
    #[serde(default)]
    pub threads: usize,
}

/// Globs of a validated [`ProjectConfig`], compiled and with languages
/// resolved against a registry.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGlobs {
    pub language_globs: Vec<(Language, Pattern)>,
    pub ignore: Vec<Pattern>,
}

impl ProjectConfig {
    pub fn validate(&self, registry: &GrammarRegistry) -> Result<(), ValidationError> {
        self.resolve(registry).map(|_| ())
    }

    /// Validates the config and compiles its globs in one pass. Every issue
    /// is collected before failing.
    pub fn resolve(&self, registry: &GrammarRegistry) -> Result<ResolvedGlobs, ValidationError> {
        let mut issues = Vec::new();
        let mut resolved = ResolvedGlobs::default();

        for (name, globs) in &self.language_globs {
            let language = registry.resolve(name).ok();
            if language.is_none() {
                issues.push(ValidationIssue::UnknownLanguage {
                    language: name.clone(),
                });
            }
            if globs.is_empty() {
                issues.push(ValidationIssue::EmptyGlobList {
                    language: name.clone(),
                });
            }
            for glob in globs {
                match (Pattern::new(glob), &language) {
                    (Ok(pattern), Some(language)) => resolved.language_globs.push((language.clone(), pattern)),
                    (Ok(_), None) => {}
                    (Err(err), _) => issues.push(ValidationIssue::InvalidGlob {
                        field: "languageGlobs",
                        glob: glob.clone(),
                        message: err.msg.to_string(),
                    }),
                }
            }
        }

        for glob in &self.ignore {
            match Pattern::new(glob) {
                Ok(pattern) => resolved.ignore.push(pattern),
                Err(err) => issues.push(ValidationIssue::InvalidGlob {
                    field: "ignore",
                    glob: glob.clone(),
                    message: err.msg.to_string(),
                }),
            }
        }

        if issues.is_empty() {
            Ok(resolved)
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    UnknownLanguage {
        language: String,
    },
    EmptyGlobList {
        language: String,
    },
    InvalidGlob {
        field: &'static str,
        glob: String,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::UnknownLanguage { language } => {
                write!(f, "languageGlobs names unknown language '{language}'")
            }
            ValidationIssue::EmptyGlobList { language } => {
                write!(f, "languageGlobs entry for '{language}' has no globs")
            }
            ValidationIssue::InvalidGlob {
                field,
                glob,
                message,
            } => write!(f, "{field} contains invalid glob '{glob}': {message}"),
        }
    }
}
