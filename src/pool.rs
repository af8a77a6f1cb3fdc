//! Thread-local parser pooling.
//!
//! Keeps one tree-sitter parser per grammar per thread, so parallel file
//! searches reuse parsers instead of re-initialising them for every file.
//! Parsers are keyed by the tree-sitter grammar itself, not the language
//! name, so registries that bind a name to different grammars stay apart.

use crate::grammar::Grammar;
use crate::tree::ParseError;
use std::cell::RefCell;
use std::collections::HashMap;
use tree_sitter::Parser;

thread_local! {
    static PARSERS: RefCell<HashMap<tree_sitter::Language, Parser>> = RefCell::new(HashMap::new());
}

/// Execute `f` with this thread's parser for `grammar`.
///
/// The first call per thread and grammar creates the parser; later calls
/// reuse it.
pub fn with_parser<F, R>(grammar: &dyn Grammar, f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut Parser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let ts_language = grammar.ts_language();
        let language_set = || ParseError::LanguageSet {
            language: grammar.language().to_string(),
        };
        if !parsers.contains_key(ts_language) {
            let mut parser = Parser::new();
            parser.set_language(ts_language).map_err(|_| language_set())?;
            parsers.insert(ts_language.clone(), parser);
        }
        let parser = parsers.get_mut(ts_language).ok_or_else(language_set)?;
        Ok(f(parser))
    })
}

/// Number of parsers pooled on the current thread.
pub fn pooled_parsers() -> usize {
    PARSERS.with(|cell| cell.borrow().len())
}
