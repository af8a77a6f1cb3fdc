//! The four public operations: dump a tree, test a rule against a
//! snippet, and search files by pattern or by rule.
//!
//! Each is a plain function over an explicit [`GrammarRegistry`]. Language
//! names are resolved before anything is parsed, so an unknown language
//! fails every operation with [`Error::UnsupportedLanguage`].

use crate::debug::{self, DumpFormat};
use crate::discover::{discover, FileSelector};
use crate::error::Error;
use crate::grammar::{GrammarRegistry, Language};
use crate::matcher::{self, MatchRecord, Matcher};
use crate::rule::RuleDocument;
use crate::search::{
    paginate, search, search_files, CancellationToken, Page, PageRequest, SearchConfig, SearchOutcome,
};
use crate::tree::parse;
use std::path::PathBuf;
use tracing::debug;

/// Everything a multi-file search needs besides the query itself.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub config: SearchConfig,
    pub selector: FileSelector,
    pub cancel: CancellationToken,
}

impl FindOptions {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_selector(mut self, selector: FileSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

pub fn render_tree(
    registry: &GrammarRegistry,
    code: &str,
    language: &str,
    format: DumpFormat,
) -> Result<String, Error> {
    let language = registry.resolve(language)?;
    debug::render_tree(registry, code, &language, format)
}

/// Matches of the rule document `rule_yaml` in `code`. `language`
/// overrides or supplies the document's `language`.
///
/// No match is an empty result, not an error.
pub fn test_rule(
    registry: &GrammarRegistry,
    code: &str,
    rule_yaml: &str,
    language: Option<&str>,
    config: &SearchConfig,
) -> Result<Vec<MatchRecord>, Error> {
    let language = language.map(|name| registry.resolve(name)).transpose()?;
    let document = RuleDocument::from_yaml(rule_yaml)?;
    let matcher = matcher::compile_rule(registry, &document, language.as_ref())?;

    let grammar = registry.grammar(matcher.language())?;
    let tree = parse(code, grammar.as_ref())?;
    let records: Vec<_> = search(&tree, &matcher, config).map(|m| m.to_record()).collect();
    debug!(rule = document.id.as_deref().unwrap_or_default(), matches = records.len(), "tested rule");
    Ok(records)
}

/// Searches the files under `roots` written in `language` for `pattern`.
pub fn find_code(
    registry: &GrammarRegistry,
    roots: &[PathBuf],
    language: &str,
    pattern: &str,
    options: &FindOptions,
) -> Result<SearchOutcome, Error> {
    let language = registry.resolve(language)?;
    let matcher = matcher::compile_pattern(registry, pattern, &language)?;
    run(registry, roots, &language, &matcher, options)
}

/// Searches the files under `roots` with a rule document. The files
/// searched are those of the document's `language`.
pub fn find_code_by_rule(
    registry: &GrammarRegistry,
    roots: &[PathBuf],
    rule_yaml: &str,
    options: &FindOptions,
) -> Result<SearchOutcome, Error> {
    let document = RuleDocument::from_yaml(rule_yaml)?;
    let matcher = matcher::compile_rule(registry, &document, None)?;
    let language = matcher.language().clone();
    run(registry, roots, &language, &matcher, options)
}

/// One page of a search outcome's matches.
pub fn page(outcome: SearchOutcome, request: PageRequest) -> Page<MatchRecord> {
    paginate(outcome.matches, request)
}

fn run(
    registry: &GrammarRegistry,
    roots: &[PathBuf],
    language: &Language,
    matcher: &Matcher,
    options: &FindOptions,
) -> Result<SearchOutcome, Error> {
    let files = discover(roots, registry, &options.selector, Some(language))?;
    search_files(registry, &files, matcher, &options.config, &options.cancel)
}
