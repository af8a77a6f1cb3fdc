use crate::rule::errors::InvalidRuleError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One rule document:
///
/// ```yaml
/// id: no-unwrap
/// language: rust
/// rule:
///   pattern: $X.unwrap()
///   inside:
///     kind: function_item
///     stopBy: end
/// constraints:
///   X:
///     kind: identifier
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub rule: SerializableRule,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, SerializableRule>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub utils: BTreeMap<String, SerializableRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl RuleDocument {
    /// Parses a single YAML rule document.
    pub fn from_yaml(text: &str) -> Result<Self, InvalidRuleError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parses a YAML stream of `---`-separated rule documents.
    pub fn parse_all(text: &str) -> Result<Vec<Self>, InvalidRuleError> {
        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_str(text) {
            documents.push(RuleDocument::deserialize(document)?);
        }
        if documents.is_empty() {
            return Err(InvalidRuleError::Syntax {
                message: "no rule document found".to_string(),
            });
        }
        Ok(documents)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

/// A rule object as written. Every key is optional; several keys on one
/// object must all hold.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializableRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inside: Option<Box<SerializableRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has: Option<Box<SerializableRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedes: Option<Box<SerializableRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follows: Option<Box<SerializableRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<SerializableRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<SerializableRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<SerializableRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    /// Only meaningful on the rule under a relational key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_by: Option<SerializableStopBy>,
    /// Only meaningful on the rule under `inside` or `has`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl SerializableRule {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.kind.is_none()
            && self.regex.is_none()
            && self.inside.is_none()
            && self.has.is_none()
            && self.precedes.is_none()
            && self.follows.is_none()
            && self.all.is_none()
            && self.any.is_none()
            && self.not.is_none()
            && self.matches.is_none()
    }
}

/// `pattern: <code>` or `pattern: {context: <code>, selector: <kind>}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Code(String),
    Contextual(ContextualPattern),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextualPattern {
    pub context: String,
    pub selector: String,
}

/// `stopBy: neighbor`, `stopBy: end`, or `stopBy: <rule>`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SerializableStopBy {
    Keyword(StopKeyword),
    Rule(Box<SerializableRule>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKeyword {
    Neighbor,
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_relational_rule() {
        let doc = RuleDocument::from_yaml(
            r#"
id: unwrap-in-fn
language: rust
rule:
  pattern: $X.unwrap()
  inside:
    kind: function_item
    stopBy: end
"#,
        )
        .unwrap();

        assert_eq!(doc.id.as_deref(), Some("unwrap-in-fn"));
        assert_eq!(doc.language.as_deref(), Some("rust"));
        assert_eq!(
            doc.rule.pattern,
            Some(PatternSpec::Code("$X.unwrap()".to_string()))
        );
        let inside = doc.rule.inside.unwrap();
        assert_eq!(inside.kind.as_deref(), Some("function_item"));
        assert_eq!(
            inside.stop_by,
            Some(SerializableStopBy::Keyword(StopKeyword::End))
        );
    }

    #[test]
    fn stop_by_accepts_a_rule() {
        let doc = RuleDocument::from_yaml(
            r#"
language: python
rule:
  kind: identifier
  inside:
    kind: call
    stopBy:
      kind: function_definition
"#,
        )
        .unwrap();

        let stop = doc.rule.inside.unwrap().stop_by.unwrap();
        match stop {
            SerializableStopBy::Rule(rule) => {
                assert_eq!(rule.kind.as_deref(), Some("function_definition"))
            }
            other => panic!("unexpected stopBy: {other:?}"),
        }
    }

    #[test]
    fn contextual_pattern() {
        let doc = RuleDocument::from_yaml(
            r#"
language: rust
rule:
  pattern:
    context: "match x { $P => $E }"
    selector: match_arm
"#,
        )
        .unwrap();
        assert!(matches!(doc.rule.pattern, Some(PatternSpec::Contextual(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RuleDocument::from_yaml("language: rust\nrule:\n  kinds: identifier\n").unwrap_err();
        assert!(matches!(err, InvalidRuleError::Syntax { .. }));
        assert!(err.to_string().contains("kinds"));
    }

    #[test]
    fn not_requires_a_single_rule() {
        let err = RuleDocument::from_yaml(
            "language: rust\nrule:\n  not:\n    - kind: identifier\n    - kind: integer_literal\n",
        )
        .unwrap_err();
        assert!(matches!(err, InvalidRuleError::Syntax { .. }));
    }

    #[test]
    fn several_documents_in_one_stream() {
        let docs = RuleDocument::parse_all(
            "id: a\nlanguage: rust\nrule:\n  kind: identifier\n---\nid: b\nlanguage: rust\nrule:\n  kind: macro_invocation\n",
        )
        .unwrap();
        let ids: Vec<_> = docs.iter().filter_map(|d| d.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn empty_rule_object_deserializes_as_empty() {
        let doc = RuleDocument::from_yaml("language: rust\nrule: {}\n").unwrap();
        assert!(doc.rule.is_empty());
    }
}
