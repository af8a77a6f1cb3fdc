use crate::grammar::Language;
use crate::matcher::env::MetaVarEnv;
use crate::tree::{Position, SyntaxNode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

/// A successful match: the matched node and the bindings collected for it.
#[derive(Debug, Clone)]
pub struct MatchResult<'t> {
    node: SyntaxNode<'t>,
    env: MetaVarEnv<'t>,
    rule_id: Option<Arc<str>>,
}

impl<'t> MatchResult<'t> {
    pub fn new(node: SyntaxNode<'t>, env: MetaVarEnv<'t>, rule_id: Option<Arc<str>>) -> Self {
        Self { node, env, rule_id }
    }

    pub fn node(&self) -> SyntaxNode<'t> {
        self.node
    }

    pub fn env(&self) -> &MetaVarEnv<'t> {
        &self.env
    }

    pub fn rule_id(&self) -> Option<&str> {
        self.rule_id.as_deref()
    }

    pub fn text(&self) -> &'t str {
        self.node.text()
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.node.byte_range()
    }

    pub fn start_position(&self) -> Position {
        self.node.start_position()
    }

    pub fn end_position(&self) -> Position {
        self.node.end_position()
    }

    /// File the matched tree was parsed from.
    pub fn path(&self) -> Option<&'t Path> {
        self.node.tree().path()
    }

    pub fn language(&self) -> &'t Language {
        self.node.tree().language()
    }

    pub fn get_single(&self, name: &str) -> Option<SyntaxNode<'t>> {
        self.env.get_single(name)
    }

    pub fn get_multi(&self, name: &str) -> Option<&[SyntaxNode<'t>]> {
        self.env.get_multi(name)
    }

    /// Source lines the match spans, in full.
    pub fn lines(&self) -> &'t str {
        let source = self.node.tree().source();
        let range = self.byte_range();
        let start = source
            .get(..range.start)
            .and_then(|before| before.rfind('\n'))
            .map_or(0, |i| i + 1);
        let end = source
            .get(range.end..)
            .and_then(|after| after.find('\n'))
            .map_or(source.len(), |i| range.end + i);
        source.get(start..end).unwrap_or_default()
    }

    /// Owned, serialisable copy that outlives the tree.
    pub fn to_record(&self) -> MatchRecord {
        let mut single = BTreeMap::new();
        for (name, node) in self.env.singles() {
            single.insert(name.to_string(), CapturedNode::from_node(node));
        }
        let mut multi = BTreeMap::new();
        for (name, nodes) in self.env.multis() {
            let captured = nodes.iter().copied().map(CapturedNode::from_node).collect();
            multi.insert(name.to_string(), captured);
        }

        MatchRecord {
            text: self.text().to_string(),
            file: self.path().map(|p| p.display().to_string()),
            language: self.language().clone(),
            rule_id: self.rule_id.as_deref().map(str::to_string),
            range: Span::of(self.node),
            lines: self.lines().to_string(),
            meta_variables: MetaVariables { single, multi },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

/// Byte and line/column extent of a node. Lines and columns are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub byte_offset: ByteRange,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn of(node: SyntaxNode<'_>) -> Self {
        let bytes = node.byte_range();
        Self {
            byte_offset: ByteRange {
                start: bytes.start,
                end: bytes.end,
            },
            start: node.start_position(),
            end: node.end_position(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedNode {
    pub text: String,
    pub range: Span,
}

impl CapturedNode {
    fn from_node(node: SyntaxNode<'_>) -> Self {
        Self {
            text: node.text().to_string(),
            range: Span::of(node),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetaVariables {
    pub single: BTreeMap<String, CapturedNode>,
    pub multi: BTreeMap<String, Vec<CapturedNode>>,
}

/// A match detached from its tree, as returned by the multi-file search and
/// written by the JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub range: Span,
    pub lines: String,
    pub meta_variables: MetaVariables,
}
