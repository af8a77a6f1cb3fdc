use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Canonical, lower-case identifier of a registered grammar (`rust`,
/// `python`, `typescript`, ...).
///
/// Every [`SyntaxTree`](crate::tree::SyntaxTree) and every compiled
/// [`Matcher`](crate::matcher::Matcher) carries exactly one `Language`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Language(Arc<str>);

impl Language {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name.trim().to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// What `parse` does when the grammar reports syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return the best-effort tree; `ERROR` and `MISSING` nodes stay in it.
    #[default]
    Tolerant,
    /// Fail with [`ParseError::Syntax`](crate::tree::ParseError::Syntax) at
    /// the first error marker.
    Strict,
}

/// A pattern fragment embedded in a parseable host snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedFragment {
    /// The full snippet handed to the parser.
    pub text: String,
    /// Byte offset of the fragment's first byte inside `text`.
    pub offset: usize,
}

impl WrappedFragment {
    pub fn new(prefix: &str, fragment: &str, suffix: &str) -> Self {
        let mut text = String::with_capacity(prefix.len() + fragment.len() + suffix.len());
        text.push_str(prefix);
        text.push_str(fragment);
        text.push_str(suffix);
        Self {
            text,
            offset: prefix.len(),
        }
    }
}

/// Parsing capability for one language.
///
/// New languages are supported by implementing this trait and registering
/// the implementation with a [`GrammarRegistry`](super::GrammarRegistry).
pub trait Grammar: Send + Sync {
    /// Canonical identifier.
    fn language(&self) -> &Language;

    /// The tree-sitter grammar that produces concrete syntax trees.
    fn ts_language(&self) -> &tree_sitter::Language;

    /// Alternative names accepted by [`GrammarRegistry::resolve`](super::GrammarRegistry::resolve).
    fn aliases(&self) -> &[&'static str] {
        &[]
    }

    /// File extensions (without the dot) used for path-based inference.
    fn extensions(&self) -> &[&'static str] {
        &[]
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Tolerant
    }

    /// Embeds a pattern fragment that does not parse at top level (for
    /// example a Rust expression) into a snippet that does.
    fn wrap_fragment(&self, _fragment: &str) -> Option<WrappedFragment> {
        None
    }

    /// Whether patterns are parsed inside [`Grammar::wrap_fragment`] before
    /// they are tried at top level. Set for languages where a bare fragment
    /// parses cleanly but as the wrong construct (Go reads `fmt.Println(x)`
    /// as a type conversion).
    fn prefers_wrapped(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("language", self.language())
            .field("error_policy", &self.error_policy())
            .field("prefers_wrapped", &self.prefers_wrapped())
            .finish()
    }
}
