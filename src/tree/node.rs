use crate::grammar::Language;
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Index of a node inside its [`SyntaxTree`]. Ids follow pre-order, so
/// comparing ids compares document order.
pub type NodeId = usize;

/// Zero-based line and column (column counted in bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self {
            line: point.row,
            column: point.column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: &'static str,
    field: Option<&'static str>,
    named: bool,
    extra: bool,
    error: bool,
    missing: bool,
    bytes: Range<usize>,
    start: Position,
    end: Position,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// One past the last descendant's id.
    subtree_end: NodeId,
}

/// A parsed file: node arena, source text and language.
pub struct SyntaxTree {
    source: String,
    language: Language,
    path: Option<PathBuf>,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// Copies a tree-sitter tree into an arena. Iterative, so arbitrarily
    /// deep trees do not grow the call stack.
    pub(crate) fn from_ts_tree(tree: &tree_sitter::Tree, source: String, language: Language) -> Self {
        let mut nodes: Vec<NodeData> = Vec::new();
        let mut parents: Vec<NodeId> = Vec::new();
        let mut cursor = tree.walk();

        'walk: loop {
            let node = cursor.node();
            let id = nodes.len();
            let parent = parents.last().copied();
            nodes.push(NodeData {
                kind: node.kind(),
                field: cursor.field_name(),
                named: node.is_named(),
                extra: node.is_extra(),
                error: node.is_error(),
                missing: node.is_missing(),
                bytes: node.byte_range(),
                start: node.start_position().into(),
                end: node.end_position().into(),
                parent,
                children: Vec::new(),
                subtree_end: id + 1,
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(id);
            }

            if cursor.goto_first_child() {
                parents.push(id);
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
                parents.pop();
            }
        }

        // Children always have larger ids than their parent.
        for id in (0..nodes.len()).rev() {
            if let Some(parent) = nodes[id].parent {
                let end = nodes[id].subtree_end;
                if end > nodes[parent].subtree_end {
                    nodes[parent].subtree_end = end;
                }
            }
        }

        Self {
            source,
            language,
            path: None,
            nodes,
        }
    }

    /// Records which file the tree was parsed from.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id: 0 }
    }

    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        (id < self.nodes.len()).then_some(SyntaxNode { tree: self, id })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of nodes, anonymous tokens included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node in pre-order, root first.
    pub fn nodes(&self) -> Descendants<'_> {
        Descendants {
            tree: self,
            next: 0,
            end: self.nodes.len(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|n| n.error || n.missing)
    }

    /// First `ERROR` or `MISSING` node in document order.
    pub fn first_error(&self) -> Option<SyntaxNode<'_>> {
        self.nodes
            .iter()
            .position(|n| n.error || n.missing)
            .map(|id| SyntaxNode { tree: self, id })
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language)
            .field("path", &self.path)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Cheap copyable handle to a node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxNode<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> &'static str {
        self.data().kind
    }

    pub fn is_named(&self) -> bool {
        self.data().named
    }

    /// Comments and other nodes the grammar allows anywhere.
    pub fn is_extra(&self) -> bool {
        self.data().extra
    }

    pub fn is_error(&self) -> bool {
        self.data().error
    }

    pub fn is_missing(&self) -> bool {
        self.data().missing
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.data().bytes.clone()
    }

    pub fn start_position(&self) -> Position {
        self.data().start
    }

    pub fn end_position(&self) -> Position {
        self.data().end
    }

    pub fn text(&self) -> &'t str {
        self.tree
            .source
            .get(self.data().bytes.clone())
            .unwrap_or_default()
    }

    /// Name of the field this node occupies in its parent.
    pub fn field_name(&self) -> Option<&'static str> {
        self.data().field
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.data().parent.map(|id| self.at(id))
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + ExactSizeIterator + 't {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    pub fn named_children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter(|child| child.is_named())
    }

    /// First child stored under `name`.
    pub fn field(&self, name: &str) -> Option<SyntaxNode<'t>> {
        self.children().find(|child| child.field_name() == Some(name))
    }

    /// All children stored under `name`, in order.
    pub fn children_by_field(&self, name: &'t str) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.children()
            .filter(move |child| child.field_name() == Some(name))
    }

    /// Position among the parent's children.
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.data().parent?;
        self.tree
            .data(parent)
            .children
            .iter()
            .position(|&id| id == self.id)
    }

    /// Named siblings after this node, nearest first.
    pub fn following_named_siblings(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        let (siblings, index) = self.sibling_slice();
        let tree = self.tree;
        siblings
            .get(index + 1..)
            .unwrap_or_default()
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
            .filter(|node| node.is_named())
    }

    /// Named siblings before this node, nearest first.
    pub fn preceding_named_siblings(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        let (siblings, index) = self.sibling_slice();
        let tree = self.tree;
        siblings
            .get(..index)
            .unwrap_or_default()
            .iter()
            .rev()
            .map(move |&id| SyntaxNode { tree, id })
            .filter(|node| node.is_named())
    }

    pub fn ancestors(&self) -> Ancestors<'t> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Strict descendants in pre-order.
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            next: self.id + 1,
            end: self.data().subtree_end,
        }
    }

    /// This node followed by its descendants, in pre-order.
    pub fn dfs(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            next: self.id,
            end: self.data().subtree_end,
        }
    }

    /// One past the id of the last node in this subtree.
    pub fn subtree_end(&self) -> NodeId {
        self.data().subtree_end
    }

    pub fn is_ancestor_of(&self, other: &SyntaxNode<'_>) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && self.id < other.id
            && other.id < self.data().subtree_end
    }

    fn sibling_slice(&self) -> (&'t [NodeId], usize) {
        let tree = self.tree;
        let Some(parent) = tree.data(self.id).parent else {
            return (&[], 0);
        };
        let siblings = tree.data(parent).children.as_slice();
        let index = siblings.iter().position(|&id| id == self.id).unwrap_or(0);
        (siblings, index)
    }

    fn at(&self, id: NodeId) -> SyntaxNode<'t> {
        SyntaxNode {
            tree: self.tree,
            id,
        }
    }

    fn data(&self) -> &'t NodeData {
        self.tree.data(self.id)
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}..{} {}-{}",
            self.kind(),
            self.data().bytes.start,
            self.data().bytes.end,
            self.start_position(),
            self.end_position()
        )
    }
}

/// Pre-order walk over a contiguous id range. Restart by calling
/// [`SyntaxNode::descendants`] again.
#[derive(Clone)]
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    next: NodeId,
    end: NodeId,
}

impl<'t> Descendants<'t> {
    /// Skips the remaining nodes of `node`'s subtree.
    pub fn skip_subtree(&mut self, node: &SyntaxNode<'t>) {
        self.next = self.next.max(node.subtree_end()).min(self.end);
    }
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let node = SyntaxNode {
            tree: self.tree,
            id: self.next,
        };
        self.next += 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Descendants<'_> {}

/// Walk from a node's parent up to the root.
pub struct Ancestors<'t> {
    next: Option<SyntaxNode<'t>>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.parent();
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::GrammarRegistry;
    use crate::tree::parse;

    fn rust_tree(source: &str) -> crate::tree::SyntaxTree {
        let registry = GrammarRegistry::builtin();
        let rust = registry.resolve("rust").unwrap();
        parse(source, registry.grammar(&rust).unwrap().as_ref()).unwrap()
    }

    #[test]
    fn ids_follow_document_order() {
        let tree = rust_tree("fn a() {}\nfn b() {}");
        let names: Vec<_> = tree
            .nodes()
            .filter(|n| n.kind() == "identifier")
            .map(|n| n.text())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn parent_and_fields_are_linked() {
        let tree = rust_tree("fn main() { let x = 1; }");
        let func = tree.root().named_children().next().unwrap();
        assert_eq!(func.kind(), "function_item");

        let name = func.field("name").unwrap();
        assert_eq!(name.text(), "main");
        assert_eq!(name.field_name(), Some("name"));
        assert_eq!(name.parent(), Some(func));
        assert_eq!(func.parent(), Some(tree.root()));
        assert!(tree.root().parent().is_none());
    }

    #[test]
    fn descendants_are_restartable_and_bounded() {
        let tree = rust_tree("fn main() { foo(1, 2); }");
        let func = tree.root().named_children().next().unwrap();
        let first: Vec<_> = func.descendants().map(|n| n.id()).collect();
        let second: Vec<_> = func.descendants().map(|n| n.id()).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|&id| id > func.id() && id < func.subtree_end()));
        assert_eq!(func.dfs().next(), Some(func));
    }

    #[test]
    fn ancestors_climb_to_root() {
        let tree = rust_tree("fn main() { foo(1); }");
        let one = tree.nodes().find(|n| n.kind() == "integer_literal").unwrap();
        let kinds: Vec<_> = one.ancestors().map(|n| n.kind()).collect();
        assert_eq!(kinds.first(), Some(&"arguments"));
        assert_eq!(kinds.last(), Some(&"source_file"));
        assert!(tree.root().is_ancestor_of(&one));
        assert!(!one.is_ancestor_of(&tree.root()));
    }

    #[test]
    fn named_siblings_skip_tokens() {
        let tree = rust_tree("fn main() { foo(a, b, c); }");
        let b = tree.nodes().find(|n| n.text() == "b").unwrap();
        let after: Vec<_> = b.following_named_siblings().map(|n| n.text()).collect();
        let before: Vec<_> = b.preceding_named_siblings().map(|n| n.text()).collect();
        assert_eq!(after, vec!["c"]);
        assert_eq!(before, vec!["a"]);
    }

    #[test]
    fn positions_are_zero_based() {
        let tree = rust_tree("\nfn main() {}");
        let func = tree.root().named_children().next().unwrap();
        assert_eq!(func.start_position().line, 1);
        assert_eq!(func.start_position().column, 0);
        assert_eq!(&tree.source()[func.byte_range()], "fn main() {}");
    }

    #[test]
    fn deep_nesting_is_handled_iteratively() {
        let depth = 300;
        let source = format!("fn main() {{ let x = {}1{}; }}", "(".repeat(depth), ")".repeat(depth));
        let tree = rust_tree(&source);
        let innermost = tree.nodes().find(|n| n.kind() == "integer_literal").unwrap();
        assert!(innermost.ancestors().count() > depth);
    }
}
