use crate::grammar::builtin::BuiltinGrammar;
use crate::grammar::errors::UnsupportedLanguageError;
use crate::grammar::language::{Grammar, Language};
use crate::tree::SourceParser;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Named node kinds and field names of one grammar.
#[derive(Debug, Clone, Default)]
pub struct KindVocabulary {
    kinds: BTreeSet<&'static str>,
    fields: BTreeSet<&'static str>,
}

impl KindVocabulary {
    /// Reads the kind and field tables out of a tree-sitter grammar.
    pub fn from_ts_language(language: &tree_sitter::Language) -> Self {
        let mut kinds = BTreeSet::new();
        for id in 0..language.node_kind_count() {
            let Ok(id) = u16::try_from(id) else {
                break;
            };
            if !language.node_kind_is_named(id) || !language.node_kind_is_visible(id) {
                continue;
            }
            if let Some(kind) = language.node_kind_for_id(id) {
                kinds.insert(kind);
            }
        }
        // Error markers are produced by every grammar but never listed.
        kinds.insert("ERROR");

        let mut fields = BTreeSet::new();
        for id in 1..=language.field_count() {
            let Ok(id) = u16::try_from(id) else {
                break;
            };
            if let Some(field) = language.field_name_for_id(id) {
                fields.insert(field);
            }
        }

        Self { kinds, fields }
    }

    pub fn kinds(&self) -> &BTreeSet<&'static str> {
        &self.kinds
    }

    pub fn fields(&self) -> &BTreeSet<&'static str> {
        &self.fields
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Closest known kind to a misspelled one.
    pub fn suggest_kind(&self, kind: &str) -> Option<String> {
        closest(kind, self.kinds.iter().copied())
    }
}

struct Entry {
    grammar: Arc<dyn Grammar>,
    vocabulary: KindVocabulary,
}

/// Read-only table of grammars, built once and passed to components.
///
/// [`GrammarRegistry::builtin`] registers every bundled grammar; tests use
/// [`GrammarRegistry::empty`] plus [`GrammarRegistry::register`] to expose
/// a reduced language set.
#[derive(Default)]
pub struct GrammarRegistry {
    entries: Vec<Entry>,
    names: HashMap<String, usize>,
}

impl GrammarRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for grammar in BuiltinGrammar::all() {
            registry.register(Arc::new(grammar));
        }
        debug!(languages = registry.entries.len(), "registered builtin grammars");
        registry
    }

    /// Adds a grammar, replacing any grammar registered under the same
    /// canonical name.
    pub fn register(&mut self, grammar: Arc<dyn Grammar>) -> &mut Self {
        let vocabulary = KindVocabulary::from_ts_language(grammar.ts_language());
        let canonical = grammar.language().as_str().to_string();

        let index = match self.names.get(&canonical) {
            Some(&index) => {
                self.names.retain(|_, i| *i != index);
                self.entries[index] = Entry {
                    grammar: Arc::clone(&grammar),
                    vocabulary,
                };
                index
            }
            None => {
                self.entries.push(Entry {
                    grammar: Arc::clone(&grammar),
                    vocabulary,
                });
                self.entries.len() - 1
            }
        };

        self.names.insert(canonical, index);
        for alias in grammar.aliases() {
            self.names
                .entry(alias.to_ascii_lowercase())
                .or_insert(index);
        }
        self
    }

    /// Resolves a user-supplied language name or alias.
    pub fn resolve(&self, name: &str) -> Result<Language, UnsupportedLanguageError> {
        let key = name.trim().to_ascii_lowercase();
        match self.names.get(&key) {
            Some(&index) => Ok(self.entries[index].grammar.language().clone()),
            None => Err(UnsupportedLanguageError::new(name.trim())
                .with_suggestion(closest(&key, self.names.keys().map(String::as_str)))),
        }
    }

    /// Parser capability for `language`.
    pub fn get_parser(&self, language: &Language) -> Result<SourceParser, UnsupportedLanguageError> {
        self.grammar(language).map(|grammar| SourceParser::new(Arc::clone(grammar)))
    }

    /// Returns the grammar registered for `language`.
    pub fn grammar(&self, language: &Language) -> Result<&Arc<dyn Grammar>, UnsupportedLanguageError> {
        self.entry(language).map(|entry| &entry.grammar)
    }

    /// Named kind vocabulary for rule validation.
    pub fn node_kinds(&self, language: &Language) -> Result<&BTreeSet<&'static str>, UnsupportedLanguageError> {
        self.entry(language).map(|entry| entry.vocabulary.kinds())
    }

    pub fn vocabulary(&self, language: &Language) -> Result<&KindVocabulary, UnsupportedLanguageError> {
        self.entry(language).map(|entry| &entry.vocabulary)
    }

    /// Registered languages in registration order.
    pub fn languages(&self) -> impl Iterator<Item = &Language> + '_ {
        self.entries.iter().map(|entry| entry.grammar.language())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Infers a language from a file extension.
    pub fn language_for_path(&self, path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.grammar.extensions().iter().any(|e| *e == ext))
            .map(|entry| entry.grammar.language().clone())
    }

    fn entry(&self, language: &Language) -> Result<&Entry, UnsupportedLanguageError> {
        self.names
            .get(language.as_str())
            .map(|&index| &self.entries[index])
            .ok_or_else(|| UnsupportedLanguageError::new(language.as_str()))
    }
}

impl fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.languages()).finish()
    }
}

fn closest<'a>(needle: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    candidates
        .map(|candidate| (strsim::jaro_winkler(needle, candidate), candidate))
        .filter(|(score, _)| *score >= 0.85)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::language::ErrorPolicy;
    use ast_grep_language::SupportLang;

    /// Rust grammar under another name, with strict error handling.
    struct StrictRust {
        language: Language,
        inner: BuiltinGrammar,
    }

    impl Grammar for StrictRust {
        fn language(&self) -> &Language {
            &self.language
        }

        fn ts_language(&self) -> &tree_sitter::Language {
            self.inner.ts_language()
        }

        fn error_policy(&self) -> ErrorPolicy {
            ErrorPolicy::Strict
        }
    }

    #[test]
    fn builtin_resolves_names_and_aliases() {
        let registry = GrammarRegistry::builtin();
        assert_eq!(registry.resolve("rust").unwrap().as_str(), "rust");
        assert_eq!(registry.resolve("RS").unwrap().as_str(), "rust");
        assert_eq!(registry.resolve("py").unwrap().as_str(), "python");
        assert_eq!(registry.resolve("ts").unwrap().as_str(), "typescript");
    }

    #[test]
    fn unknown_language_is_rejected_with_suggestion() {
        let registry = GrammarRegistry::builtin();
        let err = registry.resolve("pythn").unwrap_err();
        assert_eq!(err.name, "pythn");
        assert_eq!(err.suggestion.as_deref(), Some("python"));
        assert!(err.to_string().contains("did you mean 'python'"));
    }

    #[test]
    fn reduced_registry_only_knows_registered_languages() {
        let mut registry = GrammarRegistry::empty();
        registry.register(Arc::new(StrictRust {
            language: Language::new("strict-rust"),
            inner: BuiltinGrammar::new(SupportLang::Rust),
        }));

        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("strict-rust").is_ok());
        assert!(registry.resolve("python").is_err());
    }

    #[test]
    fn node_kinds_contain_named_kinds_only() {
        let registry = GrammarRegistry::builtin();
        let rust = registry.resolve("rust").unwrap();
        let kinds = registry.node_kinds(&rust).unwrap();
        assert!(kinds.contains("function_item"));
        assert!(kinds.contains("identifier"));
        assert!(!kinds.contains("fn"));

        let vocabulary = registry.vocabulary(&rust).unwrap();
        assert!(vocabulary.has_field("name"));
        assert_eq!(vocabulary.suggest_kind("function_itme").as_deref(), Some("function_item"));
    }

    #[test]
    fn language_for_path_uses_extensions() {
        let registry = GrammarRegistry::builtin();
        assert_eq!(
            registry.language_for_path(Path::new("src/main.rs")),
            Some(Language::new("rust"))
        );
        assert_eq!(
            registry.language_for_path(Path::new("app.tsx")),
            Some(Language::new("tsx"))
        );
        assert_eq!(registry.language_for_path(Path::new("README")), None);
    }
}
