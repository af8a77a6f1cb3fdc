//! Syngrep: structural code search over tree-sitter syntax trees.
//!
//! Source files are parsed into immutable [`SyntaxTree`]s and searched with
//! code patterns (`foo($$$ARGS)`) or YAML rule documents that combine
//! patterns, node kinds and regexes with relations (`inside`, `has`,
//! `precedes`, `follows`) and boolean combinators.
//!
//! # Architecture
//!
//! - [`grammar`]: languages and their tree-sitter grammars, held by an
//!   explicitly constructed [`GrammarRegistry`]
//! - [`tree`]: the arena syntax tree every other component reads
//! - [`pattern`] and [`rule`]: compilation of patterns and rule documents
//!   into a [`Rule`], and its evaluation at a node
//! - [`search`]: document-order search over one tree, many trees, or many
//!   files in parallel
//! - [`api`]: the four entry points used by the CLI
//!
//! # Example
//!
//! ```no_run
//! use syngrep::{compile_pattern, parse, search, GrammarRegistry, SearchConfig};
//!
//! let registry = GrammarRegistry::builtin();
//! let python = registry.resolve("python")?;
//! let grammar = registry.grammar(&python)?;
//! let tree = parse("print(1)\nprint(2)\n", grammar.as_ref())?;
//!
//! let matcher = compile_pattern(&registry, "print($X)", &python)?;
//! for found in search(&tree, &matcher, &SearchConfig::default()) {
//!     if let Some(x) = found.get_single("X") {
//!         println!("{} binds X to {}", found.text(), x.text());
//!     }
//! }
//! # Ok::<(), syngrep::Error>(())
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod debug;
pub mod discover;
pub mod error;
pub mod grammar;
pub mod matcher;
pub mod output;
pub mod pattern;
pub mod pool;
pub mod rule;
pub mod search;
pub mod tree;

// Re-exports
pub use api::{find_code, find_code_by_rule, render_tree, test_rule, FindOptions};
pub use config::{ConfigError, ProjectConfig};
pub use debug::DumpFormat;
pub use discover::{discover, FileSelector, SourceFile};
pub use error::{Error, ErrorKind, Result};
pub use grammar::{
    BuiltinGrammar, ErrorPolicy, Grammar, GrammarRegistry, Language, UnsupportedLanguageError,
};
pub use matcher::{compile_pattern, compile_rule, MatchRecord, MatchResult, Matcher, MetaVarEnv};
pub use output::OutputFormat;
pub use pattern::{InvalidPatternError, MetaVarKind, MetaVariable, Pattern};
pub use rule::{InvalidRuleError, Rule, RuleDocument, StopBy};
pub use search::{
    search, search_files, search_trees, CancellationToken, FileDiagnostic, NestedMatches, Page,
    PageRequest, SearchConfig, SearchMetadata, SearchOutcome,
};
pub use tree::{parse, ParseError, Position, SyntaxNode, SyntaxTree};
