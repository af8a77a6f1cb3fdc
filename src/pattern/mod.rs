//! Code patterns with metavariables.
//!
//! A pattern is source code of the target language in which `$NAME` stands
//! for any single named node and `$$$NAME` for any run of sibling nodes:
//!
//! - `$X + $X` matches `a + a` but not `a + b`
//! - `f($$$ARGS)` matches `f()` and `f(1, 2, 3)`
//! - `$_` and `$$$` match without binding
//!
//! Patterns are parsed with the grammar of the language they will be matched
//! against. Fragments that are not valid at the top level of a file (a Rust
//! expression, a Python `return`) are retried inside the grammar's wrapper
//! snippet; see [`Grammar::wrap_fragment`]. A missing statement terminator
//! (`printf($A)` in C) is supplied when needed.

pub mod errors;
pub mod matching;
pub mod metavar;

pub use errors::InvalidPatternError;
pub use metavar::{MetaVarKind, MetaVariable};

use crate::grammar::{Grammar, Language, WrappedFragment};
use crate::matcher::MetaVarEnv;
use crate::tree::parser::parse_strict;
use crate::tree::{NodeId, ParseError, SyntaxNode, SyntaxTree};
use metavar::ScannedPattern;
use std::fmt;
use std::ops::Range;
use tracing::debug;

const TERMINATOR: &str = ";";

/// A compiled code pattern.
pub struct Pattern {
    source: String,
    selector: Option<String>,
    language: Language,
    tree: SyntaxTree,
    root: NodeId,
    metavars: Vec<MetaVariable>,
}

impl Pattern {
    /// Compiles `source` for `grammar`'s language.
    pub fn new(source: &str, grammar: &dyn Grammar) -> Result<Self, InvalidPatternError> {
        let (scanned, tree, range) = parse_fragment(source, grammar)?;
        let root = locate_root(&tree, range)?;
        debug!(
            language = %grammar.language(),
            pattern = source,
            root = tree.node(root).map(|n| n.kind()).unwrap_or_default(),
            "compiled pattern"
        );
        Ok(Self {
            source: source.to_string(),
            selector: None,
            language: grammar.language().clone(),
            tree,
            root,
            metavars: scanned.metavars,
        })
    }

    /// Compiles a pattern whose root is the first `selector` node inside
    /// `context`. Lets fragments that never parse on their own (a match arm,
    /// an object property) be used as patterns.
    pub fn contextual(context: &str, selector: &str, grammar: &dyn Grammar) -> Result<Self, InvalidPatternError> {
        let (scanned, tree, range) = parse_fragment(context, grammar)?;
        let root = tree
            .nodes()
            .filter(|n| range.start <= n.byte_range().start && n.byte_range().end <= range.end)
            .find(|n| n.kind() == selector)
            .map(|n| n.id())
            .ok_or_else(|| InvalidPatternError::SelectorNotFound {
                selector: selector.to_string(),
            })?;
        Ok(Self {
            source: context.to_string(),
            selector: Some(selector.to_string()),
            language: grammar.language().clone(),
            tree,
            root,
            metavars: scanned.metavars,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Root of the pattern tree. Metavariables appear in it as placeholder
    /// identifiers; see [`Pattern::metavar_at`].
    pub fn root(&self) -> SyntaxNode<'_> {
        self.tree.node(self.root).unwrap_or_else(|| self.tree.root())
    }

    /// Every metavariable occurrence, in pattern order.
    pub fn metavariables(&self) -> &[MetaVariable] {
        &self.metavars
    }

    /// Kind a node must have to match, or `None` when the whole pattern is
    /// a metavariable.
    pub fn root_kind(&self) -> Option<&'static str> {
        let root = self.root();
        self.metavar_at(root).is_none().then(|| root.kind())
    }

    /// Metavariable represented by a node of this pattern's tree.
    pub fn metavar_at<'p>(&self, node: SyntaxNode<'p>) -> Option<(MetaVarKind, &'p str)> {
        matching::metavar_of(node)
    }

    /// Tests `node` against the pattern. Bindings are added to `env` only
    /// when the whole pattern matches.
    pub fn match_node<'t>(&self, node: SyntaxNode<'t>, env: &mut MetaVarEnv<'t>) -> bool {
        if let Some(kind) = self.root_kind() {
            if node.kind() != kind {
                return false;
            }
        }
        let mut trial = env.clone();
        if matching::match_node(self.root(), node, &mut trial) {
            *env = trial;
            return true;
        }
        false
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.selector == other.selector && self.language == other.language
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("selector", &self.selector)
            .field("language", &self.language)
            .field("root", &self.root().kind())
            .finish()
    }
}

/// Scans and parses `source`, returning the byte range the fragment
/// occupies in the parsed text.
///
/// The fragment is tried as is and with a statement terminator appended,
/// both at top level and inside the grammar's wrapper. The terminator never
/// becomes part of the pattern.
fn parse_fragment(
    source: &str,
    grammar: &dyn Grammar,
) -> Result<(ScannedPattern, SyntaxTree, Range<usize>), InvalidPatternError> {
    let scanned = metavar::scan(source)?;
    let text = scanned.text.as_str();
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();
    if start >= end {
        return Err(InvalidPatternError::Empty);
    }

    let terminated = format!("{}{TERMINATOR}", &text[..end]);
    let top_level = [
        WrappedFragment::new("", text, ""),
        WrappedFragment::new("", &terminated, ""),
    ];
    let wrapped = [grammar.wrap_fragment(text), grammar.wrap_fragment(&terminated)];
    let candidates: Vec<WrappedFragment> = if grammar.prefers_wrapped() {
        wrapped.into_iter().flatten().chain(top_level).collect()
    } else {
        top_level.into_iter().chain(wrapped.into_iter().flatten()).collect()
    };

    let mut error_offset = 0;
    for candidate in &candidates {
        match parse_strict(&candidate.text, grammar) {
            Ok(tree) => {
                if candidate.text != text {
                    debug!(language = %grammar.language(), context = %candidate.text, "pattern parsed in context");
                }
                let range = candidate.offset + start..candidate.offset + end;
                return Ok((scanned, tree, range));
            }
            // Only the bare fragment's error maps back onto the pattern.
            Err(ParseError::Syntax { offset, .. }) if candidate.text == text => error_offset = offset,
            Err(ParseError::Syntax { .. }) => {}
            Err(other) => return Err(other.into()),
        }
    }

    let original = scanned.original_offset(error_offset).min(source.len());
    let (line, column) = line_column(source, original);
    Err(InvalidPatternError::Syntax {
        language: grammar.language().to_string(),
        offset: original,
        line,
        column,
    })
}

/// Finds the deepest named node spanning exactly `range`.
fn locate_root(tree: &SyntaxTree, range: Range<usize>) -> Result<NodeId, InvalidPatternError> {
    let covers = |node: &SyntaxNode<'_>| {
        let bytes = node.byte_range();
        bytes.start <= range.start && range.end <= bytes.end
    };

    let mut node = tree.root();
    while let Some(child) = node.children().find(|c| covers(c)) {
        node = child;
    }
    while !node.is_named() {
        match node.parent() {
            Some(parent) => node = parent,
            None => break,
        }
    }

    if node.is_extra() {
        return Err(InvalidPatternError::Empty);
    }
    if node.byte_range() == range && node.parent().is_some() {
        return Ok(node.id());
    }

    let inner = node
        .named_children()
        .filter(|c| !c.is_extra())
        .filter(|c| range.start <= c.byte_range().start && c.byte_range().end <= range.end)
        .count();
    match inner {
        0 => Err(InvalidPatternError::Empty),
        _ => Err(InvalidPatternError::MultipleNodes),
    }
}

fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count();
    let column = before.rfind('\n').map_or(before.len(), |i| before.len() - i - 1);
    (line, column)
}
