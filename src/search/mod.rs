//! Search driver.
//!
//! [`search`] lazily yields the matches of one matcher over one or more
//! parsed trees in document order: trees in the order given, nodes in
//! pre-order. [`search_files`] reads, parses and searches many files in
//! parallel and reassembles the results in file order.

pub mod cancel;
pub mod driver;
pub mod page;

pub use cancel::CancellationToken;
pub use driver::{search_files, FileDiagnostic, SearchOutcome};
pub use page::{paginate, Page, PageError, PageRequest, SearchMetadata};

use crate::matcher::{MatchResult, Matcher};
use crate::output::OutputFormat;
use crate::tree::{Descendants, SyntaxTree};
use std::slice;

/// Whether a match inside an already reported match is reported too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestedMatches {
    /// Report every matching node, including ones nested in another match.
    #[default]
    All,
    /// Skip the subtree of every reported match.
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchConfig {
    /// Cap on the number of matches; `None` or `Some(0)` means unlimited.
    pub max_results: Option<usize>,
    /// Rendering of the results. Never changes which matches are found.
    pub output_format: OutputFormat,
    pub nested: NestedMatches,
    /// Worker threads for [`search_files`]; 0 uses rayon's default pool.
    pub threads: usize,
}

impl SearchConfig {
    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_nested(mut self, nested: NestedMatches) -> Self {
        self.nested = nested;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    /// Effective cap, with 0 normalised to unlimited.
    pub fn limit(&self) -> Option<usize> {
        self.max_results.filter(|&n| n > 0)
    }
}

/// Lazy sequence of matches over a list of trees.
pub struct Matches<'m, 't> {
    matcher: &'m Matcher,
    trees: slice::Iter<'t, SyntaxTree>,
    walk: Option<Descendants<'t>>,
    nested: NestedMatches,
    remaining: Option<usize>,
}

impl<'m, 't> Matches<'m, 't> {
    fn new(trees: &'t [SyntaxTree], matcher: &'m Matcher, config: &SearchConfig) -> Self {
        Self {
            matcher,
            trees: trees.iter(),
            walk: None,
            nested: config.nested,
            remaining: config.limit(),
        }
    }
}

impl<'t> Iterator for Matches<'_, 't> {
    type Item = MatchResult<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining == Some(0) {
                return None;
            }
            if let Some(walk) = &mut self.walk {
                while let Some(node) = walk.next() {
                    let Some(found) = self.matcher.evaluate(node) else {
                        continue;
                    };
                    if self.nested == NestedMatches::Skip {
                        walk.skip_subtree(&node);
                    }
                    if let Some(remaining) = &mut self.remaining {
                        *remaining -= 1;
                    }
                    return Some(found);
                }
            }
            let tree = self.trees.next()?;
            // Trees of another language cannot match; do not walk them.
            self.walk = (tree.language() == self.matcher.language()).then(|| tree.nodes());
        }
    }
}

/// Matches of `matcher` in one tree, in pre-order.
pub fn search<'m, 't>(tree: &'t SyntaxTree, matcher: &'m Matcher, config: &SearchConfig) -> Matches<'m, 't> {
    Matches::new(slice::from_ref(tree), matcher, config)
}

/// Matches of `matcher` across `trees`, tree by tree. `max_results` applies
/// to the whole sequence.
pub fn search_trees<'m, 't>(
    trees: &'t [SyntaxTree],
    matcher: &'m Matcher,
    config: &SearchConfig,
) -> Matches<'m, 't> {
    Matches::new(trees, matcher, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarRegistry;
    use crate::matcher::compile_pattern;
    use crate::tree::parse;

    fn python_trees(registry: &GrammarRegistry, sources: &[&str]) -> Vec<SyntaxTree> {
        let python = registry.resolve("python").unwrap();
        let grammar = registry.grammar(&python).unwrap();
        sources
            .iter()
            .map(|s| parse(s, grammar.as_ref()).unwrap())
            .collect()
    }

    fn texts<'t>(matches: impl Iterator<Item = MatchResult<'t>>) -> Vec<String> {
        matches.map(|m| m.text().to_string()).collect()
    }

    #[test]
    fn max_results_takes_first_in_document_order() {
        let registry = GrammarRegistry::builtin();
        let python = registry.resolve("python").unwrap();
        let trees = python_trees(&registry, &["f(1)\nf(2)\n", "f(3)\nf(4)\n"]);
        let matcher = compile_pattern(&registry, "f($X)", &python).unwrap();

        let all = texts(search_trees(&trees, &matcher, &SearchConfig::default()));
        assert_eq!(all, vec!["f(1)", "f(2)", "f(3)", "f(4)"]);

        let config = SearchConfig::default().with_max_results(Some(3));
        let first = texts(search_trees(&trees, &matcher, &config));
        assert_eq!(first, vec!["f(1)", "f(2)", "f(3)"]);

        let config = SearchConfig::default().with_max_results(Some(0));
        assert_eq!(search_trees(&trees, &matcher, &config).count(), 4);
    }

    #[test]
    fn nested_matches_are_reported_by_default() {
        let registry = GrammarRegistry::builtin();
        let python = registry.resolve("python").unwrap();
        let trees = python_trees(&registry, &["f(f(1))\n"]);
        let matcher = compile_pattern(&registry, "f($X)", &python).unwrap();

        let all = texts(search(&trees[0], &matcher, &SearchConfig::default()));
        assert_eq!(all, vec!["f(f(1))", "f(1)"]);

        let config = SearchConfig::default().with_nested(NestedMatches::Skip);
        let outer = texts(search(&trees[0], &matcher, &config));
        assert_eq!(outer, vec!["f(f(1))"]);
    }

    #[test]
    fn search_is_restartable() {
        let registry = GrammarRegistry::builtin();
        let python = registry.resolve("python").unwrap();
        let trees = python_trees(&registry, &["g(1)\ng(2)\n"]);
        let matcher = compile_pattern(&registry, "g($X)", &python).unwrap();

        let config = SearchConfig::default();
        let first = texts(search(&trees[0], &matcher, &config));
        let second = texts(search(&trees[0], &matcher, &config));
        assert_eq!(first, second);
    }

    #[test]
    fn trees_in_other_languages_are_skipped() {
        let registry = GrammarRegistry::builtin();
        let python = registry.resolve("python").unwrap();
        let js = registry.resolve("javascript").unwrap();
        let js_tree = parse("f(1)", registry.grammar(&js).unwrap().as_ref()).unwrap();
        let matcher = compile_pattern(&registry, "f($X)", &python).unwrap();

        assert_eq!(search(&js_tree, &matcher, &SearchConfig::default()).count(), 0);
    }

    #[test]
    fn match_spans_slice_the_source() {
        let registry = GrammarRegistry::builtin();
        let python = registry.resolve("python").unwrap();
        let trees = python_trees(&registry, &["x = 1\nprint(x + 2)\n"]);
        let matcher = compile_pattern(&registry, "print($A + 2)", &python).unwrap();

        let found: Vec<_> = search(&trees[0], &matcher, &SearchConfig::default()).collect();
        assert_eq!(found.len(), 1);
        let range = found[0].byte_range();
        assert_eq!(&trees[0].source()[range], "print(x + 2)");
    }
}
