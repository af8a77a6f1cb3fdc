//! Rule evaluation against syntax nodes.
//!
//! Every evaluation either succeeds and extends the environment, or fails
//! and leaves it as it was.

use crate::matcher::MetaVarEnv;
use crate::rule::{Relation, Rule, StopBy};
use crate::tree::SyntaxNode;

impl Rule {
    /// Tests `node`, adding metavariable bindings to `env` on success.
    pub fn matches<'t>(&self, node: SyntaxNode<'t>, env: &mut MetaVarEnv<'t>) -> bool {
        try_match(env, |trial| self.eval(node, trial))
    }

    fn eval<'t>(&self, node: SyntaxNode<'t>, env: &mut MetaVarEnv<'t>) -> bool {
        match self {
            Rule::Pattern(pattern) => pattern.match_node(node, env),
            Rule::Kind(kind) => node.kind() == kind,
            Rule::Regex(regex) => regex.is_match(node.text()),
            Rule::Inside(relation) => inside(relation, node, env),
            Rule::Has(relation) => has(relation, node, env),
            Rule::Precedes(relation) => {
                let siblings = node.following_named_siblings();
                first_match(relation, siblings, env)
            }
            Rule::Follows(relation) => {
                let siblings = node.preceding_named_siblings();
                first_match(relation, siblings, env)
            }
            Rule::All(rules) => rules.iter().all(|rule| rule.eval(node, env)),
            Rule::Any(rules) => rules.iter().any(|rule| rule.matches(node, env)),
            Rule::Not(rule) => !rule.eval(node, &mut env.clone()),
            Rule::Matches(_, rule) => rule.eval(node, env),
        }
    }
}

fn try_match<'t>(env: &mut MetaVarEnv<'t>, f: impl FnOnce(&mut MetaVarEnv<'t>) -> bool) -> bool {
    let mut trial = env.clone();
    if f(&mut trial) {
        *env = trial;
        true
    } else {
        false
    }
}

/// Whether `node` ends the search of a rule-bounded relation. Bindings made
/// while testing the boundary are discarded.
fn is_boundary(stop_by: &StopBy, node: SyntaxNode<'_>) -> bool {
    match stop_by {
        StopBy::Rule(stop) => stop.eval(node, &mut MetaVarEnv::new()),
        StopBy::Neighbor | StopBy::End => false,
    }
}

/// Tests candidates in order, stopping at the first match, at a boundary,
/// or after the first candidate for `neighbor`.
fn first_match<'t>(
    relation: &Relation,
    candidates: impl Iterator<Item = SyntaxNode<'t>>,
    env: &mut MetaVarEnv<'t>,
) -> bool {
    for candidate in candidates {
        if is_boundary(&relation.stop_by, candidate) {
            return false;
        }
        if relation.rule.matches(candidate, env) {
            return true;
        }
        if relation.stop_by == StopBy::Neighbor {
            return false;
        }
    }
    false
}

fn inside<'t>(relation: &Relation, node: SyntaxNode<'t>, env: &mut MetaVarEnv<'t>) -> bool {
    let mut child = node;
    for ancestor in node.ancestors() {
        if is_boundary(&relation.stop_by, ancestor) {
            return false;
        }
        let via_field = relation
            .field
            .as_deref()
            .map_or(true, |field| child.field_name() == Some(field));
        if via_field && relation.rule.matches(ancestor, env) {
            return true;
        }
        if relation.stop_by == StopBy::Neighbor {
            return false;
        }
        child = ancestor;
    }
    false
}

fn has<'t>(relation: &Relation, node: SyntaxNode<'t>, env: &mut MetaVarEnv<'t>) -> bool {
    let in_field = |child: &SyntaxNode<'_>| {
        relation
            .field
            .as_deref()
            .map_or(true, |field| child.field_name() == Some(field))
    };

    if relation.stop_by == StopBy::Neighbor {
        let children = node.children().filter(|c| in_field(c));
        return first_match(relation, children, env);
    }

    for child in node.children().filter(|c| in_field(c)) {
        let mut walk = child.dfs();
        while let Some(candidate) = walk.next() {
            if is_boundary(&relation.stop_by, candidate) {
                walk.skip_subtree(&candidate);
                continue;
            }
            if relation.rule.matches(candidate, env) {
                return true;
            }
        }
    }
    false
}
