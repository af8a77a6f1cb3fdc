//! Grammar registry: maps language identifiers to tree-sitter grammars.
//!
//! Grammars are capability objects implementing [`Grammar`]. The bundled
//! grammars come from `ast-grep-language`; tests and embedders can build a
//! reduced [`GrammarRegistry`] and register their own implementations.

pub mod builtin;
pub mod errors;
pub mod language;
pub mod registry;

pub use builtin::BuiltinGrammar;
pub use errors::UnsupportedLanguageError;
pub use language::{ErrorPolicy, Grammar, Language, WrappedFragment};
pub use registry::{GrammarRegistry, KindVocabulary};
