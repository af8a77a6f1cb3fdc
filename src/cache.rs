//! Thread-local compiled pattern cache.
//!
//! Rules often repeat the same pattern (in `any` branches, utilities and
//! constraints), and the CLI compiles one rule per file batch. Caching the
//! parsed pattern tree avoids re-parsing it each time.
//! Cache is capped at 256 entries; when full it is cleared.

use crate::grammar::{Grammar, Language};
use crate::pattern::{InvalidPatternError, Pattern};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

const MAX_CACHE_ENTRIES: usize = 256;

/// Everything pattern compilation depends on. Two grammars registered
/// under one name but with different tree-sitter grammars or wrappers
/// never share an entry.
#[derive(PartialEq, Eq, Hash)]
struct CacheKey {
    ts_language: tree_sitter::Language,
    language: Language,
    wrapper: Option<String>,
    prefers_wrapped: bool,
    selector: Option<String>,
    pattern: String,
}

impl CacheKey {
    fn new(pattern: &str, selector: Option<&str>, grammar: &dyn Grammar) -> Self {
        Self {
            ts_language: grammar.ts_language().clone(),
            language: grammar.language().clone(),
            wrapper: grammar.wrap_fragment("").map(|w| w.text),
            prefers_wrapped: grammar.prefers_wrapped(),
            selector: selector.map(str::to_string),
            pattern: pattern.to_string(),
        }
    }
}

thread_local! {
    static PATTERN_CACHE: RefCell<HashMap<CacheKey, Arc<Pattern>>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled pattern from cache, or compile and cache it.
///
/// Compilation errors are returned and not cached.
pub fn get_or_compile_pattern(
    pattern: &str,
    selector: Option<&str>,
    grammar: &dyn Grammar,
) -> Result<Arc<Pattern>, InvalidPatternError> {
    let cache_key = CacheKey::new(pattern, selector, grammar);

    if let Some(hit) = PATTERN_CACHE.with(|cache| cache.borrow().get(&cache_key).cloned()) {
        return Ok(hit);
    }

    let compiled = Arc::new(match selector {
        Some(selector) => Pattern::contextual(pattern, selector, grammar)?,
        None => Pattern::new(pattern, grammar)?,
    });

    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }
        cache.insert(cache_key, Arc::clone(&compiled));
    });
    Ok(compiled)
}

/// Clear the pattern cache (mainly for testing).
pub fn clear_cache() {
    PATTERN_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

/// Number of cached patterns on this thread.
pub fn cache_size() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}
