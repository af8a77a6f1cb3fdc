//! Structural comparison of a pattern tree against a source subtree.

use crate::matcher::MetaVarEnv;
use crate::pattern::metavar::{self, MetaVarKind};
use crate::tree::SyntaxNode;

/// Metavariable a pattern node stands for, if its whole text is a
/// placeholder.
pub(crate) fn metavar_of<'p>(node: SyntaxNode<'p>) -> Option<(MetaVarKind, &'p str)> {
    metavar::parse_placeholder(node.text())
}

/// Matches `pnode` against `snode`. On failure `env` may hold partial
/// bindings; callers that need atomicity work on a clone.
pub(crate) fn match_node<'t>(
    pnode: SyntaxNode<'_>,
    snode: SyntaxNode<'t>,
    env: &mut MetaVarEnv<'t>,
) -> bool {
    if let Some((kind, name)) = metavar_of(pnode) {
        if !snode.is_named() || snode.is_extra() {
            return false;
        }
        return match kind {
            MetaVarKind::Single => env.insert_single(name, snode),
            MetaVarKind::Multi => env.insert_multi(name, vec![snode]),
        };
    }

    if pnode.kind() != snode.kind() {
        return false;
    }

    if pnode.child_count() == 0 {
        return pnode.text() == snode.text();
    }

    let pkids: Vec<_> = pnode.children().filter(|n| !n.is_extra()).collect();
    let skids: Vec<_> = snode.children().filter(|n| !n.is_extra()).collect();
    match_sequence(&pkids, &skids, env)
}

/// Matches two child sequences. A variadic metavariable takes as many
/// source nodes as it can and gives them back one at a time until the rest
/// of the sequence matches.
///
/// Unnamed source tokens the pattern does not mention (a trailing `;` or
/// `,`) are skipped. Named source nodes must all be accounted for.
fn match_sequence<'t>(
    pkids: &[SyntaxNode<'_>],
    skids: &[SyntaxNode<'t>],
    env: &mut MetaVarEnv<'t>,
) -> bool {
    let Some((first, rest)) = pkids.split_first() else {
        return skids.iter().all(|n| !n.is_named());
    };

    if let Some((MetaVarKind::Multi, name)) = metavar_of(*first) {
        for take in (0..=skids.len()).rev() {
            let (consumed, remaining) = skids.split_at(take);
            let mut trial = env.clone();
            let named = consumed.iter().copied().filter(|n| n.is_named()).collect();
            if trial.insert_multi(name, named) && match_sequence(rest, remaining, &mut trial) {
                *env = trial;
                return true;
            }
        }
        return false;
    }

    let Some((head, tail)) = skids.split_first() else {
        return false;
    };
    let mut trial = env.clone();
    if match_node(*first, *head, &mut trial) && match_sequence(rest, tail, &mut trial) {
        *env = trial;
        return true;
    }
    !head.is_named() && match_sequence(pkids, tail, env)
}
