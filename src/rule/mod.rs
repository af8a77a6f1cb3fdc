//! Structured rules.
//!
//! A [`RuleDocument`] is deserialised into [`SerializableRule`] objects and
//! compiled into a [`Rule`], a sum type with one variant per rule kind.
//! Compilation validates everything that can be checked without a target
//! tree (node kinds, field names, regexes, utility references), so a rule
//! that compiles never fails during evaluation.

pub mod compile;
pub mod errors;
pub mod evaluate;
pub mod schema;

pub use compile::RuleCompiler;
pub use errors::InvalidRuleError;
pub use schema::{
    ContextualPattern, PatternSpec, RuleDocument, SerializableRule, SerializableStopBy, Severity,
    StopKeyword,
};

use crate::pattern::Pattern;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A compiled rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Pattern(Arc<Pattern>),
    Kind(String),
    Regex(TextRegex),
    Inside(Box<Relation>),
    Has(Box<Relation>),
    Precedes(Box<Relation>),
    Follows(Box<Relation>),
    All(Vec<Rule>),
    Any(Vec<Rule>),
    Not(Box<Rule>),
    /// Reference to a utility rule, kept by name for display and equality.
    Matches(String, Arc<Rule>),
}

/// Target and traversal bounds of a relational rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub rule: Rule,
    pub stop_by: StopBy,
    pub field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum StopBy {
    /// Only the parent, the direct children, or the adjacent sibling.
    #[default]
    Neighbor,
    /// Up to the root, down to the leaves, or to the last sibling.
    End,
    /// Until a node matching the rule; that node is not tested.
    Rule(Rule),
}

/// A compiled regex compared by its source text.
#[derive(Clone)]
pub struct TextRegex(Regex);

impl TextRegex {
    pub fn new(regex: Regex) -> Self {
        Self(regex)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for TextRegex {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Debug for TextRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.0.as_str())
    }
}
