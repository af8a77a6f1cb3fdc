//! Metavariable bindings accumulated while a rule is evaluated.

use crate::tree::SyntaxNode;
use std::collections::HashMap;

/// Returns whether a metavariable name is anonymous (`$_`, `$_TMP`).
///
/// Anonymous metavariables match like named ones but are never bound, so
/// repeating them does not force equal text.
pub fn is_anonymous(name: &str) -> bool {
    name.starts_with('_')
}

/// Bindings of metavariable names to matched nodes.
///
/// Inserting a name that is already bound succeeds only when the new value
/// renders to the same text as the existing one.
#[derive(Debug, Clone, Default)]
pub struct MetaVarEnv<'t> {
    single: HashMap<String, SyntaxNode<'t>>,
    multi: HashMap<String, Vec<SyntaxNode<'t>>>,
}

impl<'t> MetaVarEnv<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to one node. Returns false on a conflicting binding.
    pub fn insert_single(&mut self, name: &str, node: SyntaxNode<'t>) -> bool {
        if is_anonymous(name) {
            return true;
        }
        match self.single.get(name) {
            Some(existing) => existing.text() == node.text(),
            None => {
                self.single.insert(name.to_string(), node);
                true
            }
        }
    }

    /// Binds `name` to a node sequence. Returns false on a conflicting
    /// binding.
    pub fn insert_multi(&mut self, name: &str, nodes: Vec<SyntaxNode<'t>>) -> bool {
        if is_anonymous(name) {
            return true;
        }
        match self.multi.get(name) {
            Some(existing) => {
                existing.len() == nodes.len()
                    && existing
                        .iter()
                        .zip(nodes.iter())
                        .all(|(a, b)| a.text() == b.text())
            }
            None => {
                self.multi.insert(name.to_string(), nodes);
                true
            }
        }
    }

    pub fn get_single(&self, name: &str) -> Option<SyntaxNode<'t>> {
        self.single.get(name).copied()
    }

    pub fn get_multi(&self, name: &str) -> Option<&[SyntaxNode<'t>]> {
        self.multi.get(name).map(Vec::as_slice)
    }

    pub fn singles(&self) -> impl Iterator<Item = (&str, SyntaxNode<'t>)> + '_ {
        self.single.iter().map(|(name, node)| (name.as_str(), *node))
    }

    pub fn multis(&self) -> impl Iterator<Item = (&str, &[SyntaxNode<'t>])> + '_ {
        self.multi
            .iter()
            .map(|(name, nodes)| (name.as_str(), nodes.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.multi.is_empty()
    }

    pub fn len(&self) -> usize {
        self.single.len() + self.multi.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{BuiltinGrammar, Grammar};
    use crate::tree::parse;
    use ast_grep_language::SupportLang;

    fn identifiers(source: &str) -> crate::tree::SyntaxTree {
        let grammar = BuiltinGrammar::new(SupportLang::Python);
        assert_eq!(grammar.language().as_str(), "python");
        parse(source, &grammar).unwrap()
    }

    #[test]
    fn repeated_single_binding_requires_equal_text() {
        let tree = identifiers("a + a + b");
        let ids: Vec<_> = tree.nodes().filter(|n| n.kind() == "identifier").collect();
        let mut env = MetaVarEnv::new();

        assert!(env.insert_single("X", ids[0]));
        assert!(env.insert_single("X", ids[1]));
        assert!(!env.insert_single("X", ids[2]));
        assert_eq!(env.get_single("X").map(|n| n.text()), Some("a"));
    }

    #[test]
    fn anonymous_names_are_never_bound() {
        let tree = identifiers("a + b");
        let ids: Vec<_> = tree.nodes().filter(|n| n.kind() == "identifier").collect();
        let mut env = MetaVarEnv::new();

        assert!(env.insert_single("_", ids[0]));
        assert!(env.insert_single("_", ids[1]));
        assert!(env.is_empty());
    }

    #[test]
    fn multi_binding_compares_sequences() {
        let tree = identifiers("f(a, b)\ng(a, b)\nh(a)");
        let args: Vec<Vec<_>> = tree
            .nodes()
            .filter(|n| n.kind() == "argument_list")
            .map(|list| list.named_children().collect())
            .collect();
        let mut env = MetaVarEnv::new();

        assert!(env.insert_multi("ARGS", args[0].clone()));
        assert!(env.insert_multi("ARGS", args[1].clone()));
        assert!(!env.insert_multi("ARGS", args[2].clone()));
        assert_eq!(env.get_multi("ARGS").map(<[_]>::len), Some(2));
    }
}
