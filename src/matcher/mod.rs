//! Compiled matchers and their results.

pub mod env;
pub mod result;

pub use env::{is_anonymous, MetaVarEnv};
pub use result::{ByteRange, CapturedNode, MatchRecord, MatchResult, MetaVariables, Span};

use crate::cache;
use crate::error::Error;
use crate::grammar::{GrammarRegistry, Language};
use crate::rule::{InvalidRuleError, Rule, RuleCompiler, RuleDocument};
use crate::tree::SyntaxNode;
use std::sync::Arc;
use tracing::debug;

/// A compiled rule bound to one language, with the per-metavariable
/// constraints of its document.
#[derive(Debug, Clone, PartialEq)]
pub struct Matcher {
    id: Option<Arc<str>>,
    language: Language,
    rule: Rule,
    constraints: Vec<(String, Rule)>,
}

impl Matcher {
    pub fn new(language: Language, rule: Rule) -> Self {
        Self {
            id: None,
            language,
            rule,
            constraints: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_constraint(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.constraints.push((name.into(), rule));
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Evaluates the matcher at `node`. Nodes of a tree in another language
    /// never match.
    pub fn evaluate<'t>(&self, node: SyntaxNode<'t>) -> Option<MatchResult<'t>> {
        if node.tree().language() != &self.language {
            return None;
        }
        let mut env = MetaVarEnv::new();
        if !self.rule.matches(node, &mut env) {
            return None;
        }
        if !self.constraints_hold(&mut env) {
            return None;
        }
        Some(MatchResult::new(node, env, self.id.clone()))
    }

    /// A constraint rejects the match when its metavariable is unbound or
    /// when any node bound to it fails the constraint rule.
    fn constraints_hold<'t>(&self, env: &mut MetaVarEnv<'t>) -> bool {
        for (name, rule) in &self.constraints {
            let bound: Vec<SyntaxNode<'t>> = match (env.get_single(name), env.get_multi(name)) {
                (Some(node), _) => vec![node],
                (None, Some(nodes)) => nodes.to_vec(),
                (None, None) => return false,
            };
            if !bound.into_iter().all(|node| rule.matches(node, env)) {
                return false;
            }
        }
        true
    }
}

/// Compiles a code pattern into a matcher.
pub fn compile_pattern(
    registry: &GrammarRegistry,
    pattern: &str,
    language: &Language,
) -> Result<Matcher, Error> {
    let grammar = registry.grammar(language)?;
    let compiled = cache::get_or_compile_pattern(pattern, None, grammar.as_ref())?;
    Ok(Matcher::new(language.clone(), Rule::Pattern(compiled)))
}

/// Compiles a rule document. `language`, when given, must agree with the
/// document's own `language`; one of the two is required.
pub fn compile_rule(
    registry: &GrammarRegistry,
    document: &RuleDocument,
    language: Option<&Language>,
) -> Result<Matcher, Error> {
    let language = match (document.language.as_deref(), language) {
        (Some(declared), Some(requested)) => {
            let declared = registry.resolve(declared)?;
            if &declared != requested {
                return Err(InvalidRuleError::LanguageMismatch {
                    rule: declared.to_string(),
                    requested: requested.to_string(),
                }
                .into());
            }
            declared
        }
        (Some(declared), None) => registry.resolve(declared)?,
        (None, Some(requested)) => {
            registry.grammar(requested)?;
            requested.clone()
        }
        (None, None) => return Err(InvalidRuleError::MissingLanguage.into()),
    };

    let mut compiler =
        RuleCompiler::for_language(registry, &language)?.with_utils(document.utils.clone());
    compiler.compile_utils()?;
    let rule = compiler.compile(&document.rule)?;

    let mut matcher = Matcher::new(language, rule);
    for (name, constraint) in &document.constraints {
        let compiled = compiler.compile_at(constraint, &format!("constraints.{name}"))?;
        matcher = matcher.with_constraint(name.clone(), compiled);
    }
    if let Some(id) = &document.id {
        matcher = matcher.with_id(id.as_str());
    }

    debug!(
        id = matcher.id().unwrap_or("<anonymous>"),
        language = %matcher.language(),
        constraints = matcher.constraints.len(),
        "compiled rule document"
    );
    Ok(matcher)
}
