use crate::cache;
use crate::grammar::{Grammar, GrammarRegistry, KindVocabulary, Language, UnsupportedLanguageError};
use crate::rule::errors::InvalidRuleError;
use crate::rule::schema::{PatternSpec, SerializableRule, SerializableStopBy, StopKeyword};
use crate::rule::{Relation, Rule, StopBy, TextRegex};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Compiles rule objects for one language.
///
/// Utility rules are compiled on first reference and shared between every
/// `matches` that names them.
pub struct RuleCompiler<'a> {
    grammar: &'a dyn Grammar,
    vocabulary: &'a KindVocabulary,
    utils: BTreeMap<String, SerializableRule>,
    compiled_utils: HashMap<String, Arc<Rule>>,
    visiting: Vec<String>,
}

impl<'a> RuleCompiler<'a> {
    pub fn new(grammar: &'a dyn Grammar, vocabulary: &'a KindVocabulary) -> Self {
        Self {
            grammar,
            vocabulary,
            utils: BTreeMap::new(),
            compiled_utils: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    pub fn for_language(
        registry: &'a GrammarRegistry,
        language: &Language,
    ) -> Result<Self, UnsupportedLanguageError> {
        let grammar = registry.grammar(language)?;
        let vocabulary = registry.vocabulary(language)?;
        Ok(Self::new(grammar.as_ref(), vocabulary))
    }

    /// Makes `utils` available to `matches`.
    pub fn with_utils(mut self, utils: BTreeMap<String, SerializableRule>) -> Self {
        self.utils = utils;
        self
    }

    pub fn language(&self) -> &Language {
        self.grammar.language()
    }

    /// Compiles every utility rule, so that unused ones are validated too.
    pub fn compile_utils(&mut self) -> Result<(), InvalidRuleError> {
        let ids: Vec<String> = self.utils.keys().cloned().collect();
        for id in ids {
            self.compile_util(&id, &format!("utils.{id}"))?;
        }
        Ok(())
    }

    /// Compiles the top-level rule of a document.
    pub fn compile(&mut self, rule: &SerializableRule) -> Result<Rule, InvalidRuleError> {
        self.compile_at(rule, "rule")
    }

    /// Compiles `rule`, reporting problems relative to `path`.
    pub fn compile_at(&mut self, rule: &SerializableRule, path: &str) -> Result<Rule, InvalidRuleError> {
        let compiled = self.compile_rule(rule, path, false)?;
        debug!(language = %self.language(), path, "compiled rule");
        Ok(compiled)
    }

    fn compile_rule(
        &mut self,
        rule: &SerializableRule,
        path: &str,
        in_relation: bool,
    ) -> Result<Rule, InvalidRuleError> {
        if !in_relation {
            if rule.stop_by.is_some() {
                return Err(InvalidRuleError::RelationOnly {
                    path: path.to_string(),
                    key: "stopBy",
                });
            }
            if rule.field.is_some() {
                return Err(InvalidRuleError::RelationOnly {
                    path: path.to_string(),
                    key: "field",
                });
            }
        }
        if rule.is_empty() {
            return Err(InvalidRuleError::EmptyRule {
                path: path.to_string(),
            });
        }

        let mut parts = Vec::new();

        if let Some(pattern) = &rule.pattern {
            parts.push(self.compile_pattern(pattern, &format!("{path}.pattern"))?);
        }
        if let Some(kind) = &rule.kind {
            parts.push(self.compile_kind(kind, &format!("{path}.kind"))?);
        }
        if let Some(regex) = &rule.regex {
            let compiled = Regex::new(regex).map_err(|err| InvalidRuleError::Regex {
                path: format!("{path}.regex"),
                message: err.to_string(),
            })?;
            parts.push(Rule::Regex(TextRegex::new(compiled)));
        }
        if let Some(inside) = &rule.inside {
            let relation = self.compile_relation(inside, &format!("{path}.inside"), "inside")?;
            parts.push(Rule::Inside(Box::new(relation)));
        }
        if let Some(has) = &rule.has {
            let relation = self.compile_relation(has, &format!("{path}.has"), "has")?;
            parts.push(Rule::Has(Box::new(relation)));
        }
        if let Some(precedes) = &rule.precedes {
            let relation = self.compile_relation(precedes, &format!("{path}.precedes"), "precedes")?;
            parts.push(Rule::Precedes(Box::new(relation)));
        }
        if let Some(follows) = &rule.follows {
            let relation = self.compile_relation(follows, &format!("{path}.follows"), "follows")?;
            parts.push(Rule::Follows(Box::new(relation)));
        }
        if let Some(all) = &rule.all {
            parts.push(Rule::All(self.compile_list(all, path, "all")?));
        }
        if let Some(any) = &rule.any {
            parts.push(Rule::Any(self.compile_list(any, path, "any")?));
        }
        if let Some(not) = &rule.not {
            let inner = self.compile_rule(not, &format!("{path}.not"), false)?;
            parts.push(Rule::Not(Box::new(inner)));
        }
        if let Some(id) = &rule.matches {
            let util = self.compile_util(id, &format!("{path}.matches"))?;
            parts.push(Rule::Matches(id.clone(), util));
        }

        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Rule::All(parts))
        }
    }

    fn compile_pattern(&self, spec: &PatternSpec, path: &str) -> Result<Rule, InvalidRuleError> {
        let compiled = match spec {
            PatternSpec::Code(code) => cache::get_or_compile_pattern(code, None, self.grammar),
            PatternSpec::Contextual(ctx) => {
                cache::get_or_compile_pattern(&ctx.context, Some(&ctx.selector), self.grammar)
            }
        };
        compiled
            .map(Rule::Pattern)
            .map_err(|source| InvalidRuleError::Pattern {
                path: path.to_string(),
                source,
            })
    }

    fn compile_kind(&self, kind: &str, path: &str) -> Result<Rule, InvalidRuleError> {
        if self.vocabulary.has_kind(kind) {
            return Ok(Rule::Kind(kind.to_string()));
        }
        Err(InvalidRuleError::UnknownKind {
            path: path.to_string(),
            kind: kind.to_string(),
            language: self.language().to_string(),
            suggestion: self.vocabulary.suggest_kind(kind),
        })
    }

    fn compile_list(
        &mut self,
        rules: &[SerializableRule],
        path: &str,
        key: &'static str,
    ) -> Result<Vec<Rule>, InvalidRuleError> {
        if rules.is_empty() {
            return Err(InvalidRuleError::EmptyList {
                path: format!("{path}.{key}"),
                key,
            });
        }
        rules
            .iter()
            .enumerate()
            .map(|(i, rule)| self.compile_rule(rule, &format!("{path}.{key}[{i}]"), false))
            .collect()
    }

    fn compile_relation(
        &mut self,
        rule: &SerializableRule,
        path: &str,
        relation: &'static str,
    ) -> Result<Relation, InvalidRuleError> {
        let target = self.compile_rule(rule, path, true)?;

        let stop_by = match &rule.stop_by {
            None | Some(SerializableStopBy::Keyword(StopKeyword::Neighbor)) => StopBy::Neighbor,
            Some(SerializableStopBy::Keyword(StopKeyword::End)) => StopBy::End,
            Some(SerializableStopBy::Rule(stop)) => {
                StopBy::Rule(self.compile_rule(stop, &format!("{path}.stopBy"), false)?)
            }
        };

        let field = match &rule.field {
            None => None,
            Some(_) if matches!(relation, "precedes" | "follows") => {
                return Err(InvalidRuleError::FieldNotAllowed {
                    path: format!("{path}.field"),
                    relation,
                });
            }
            Some(field) if !self.vocabulary.has_field(field) => {
                return Err(InvalidRuleError::UnknownField {
                    path: format!("{path}.field"),
                    field: field.clone(),
                    language: self.language().to_string(),
                });
            }
            Some(field) => Some(field.clone()),
        };

        Ok(Relation {
            rule: target,
            stop_by,
            field,
        })
    }

    fn compile_util(&mut self, id: &str, path: &str) -> Result<Arc<Rule>, InvalidRuleError> {
        if let Some(rule) = self.compiled_utils.get(id) {
            return Ok(Arc::clone(rule));
        }
        if let Some(start) = self.visiting.iter().position(|v| v == id) {
            let mut cycle = self.visiting[start..].to_vec();
            cycle.push(id.to_string());
            return Err(InvalidRuleError::UtilCycle {
                path: path.to_string(),
                cycle: cycle.join(" -> "),
            });
        }
        let Some(definition) = self.utils.get(id).cloned() else {
            return Err(InvalidRuleError::UnknownUtil {
                path: path.to_string(),
                id: id.to_string(),
            });
        };

        self.visiting.push(id.to_string());
        let compiled = self.compile_rule(&definition, &format!("utils.{id}"), false);
        self.visiting.pop();

        let rule = Arc::new(compiled?);
        self.compiled_utils.insert(id.to_string(), Arc::clone(&rule));
        Ok(rule)
    }
}
