//! Metavariable scanning.
//!
//! `$NAME` and `$$$NAME` are replaced by identifier placeholders so that the
//! pattern parses as ordinary source code. The placeholder encodes both the
//! kind and the name, which lets the matcher recover them from node text.

use crate::pattern::errors::InvalidPatternError;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

const SINGLE_PREFIX: &str = "__sgmeta1_";
const MULTI_PREFIX: &str = "__sgmetaN_";

/// Name used for a bare `$$$`.
pub const ANONYMOUS: &str = "_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaVarKind {
    /// `$NAME`: exactly one named node.
    Single,
    /// `$$$NAME`: zero or more sibling nodes.
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaVariable {
    pub name: String,
    pub kind: MetaVarKind,
    /// Byte offset of the leading `$` in the pattern text.
    pub offset: usize,
}

impl MetaVariable {
    pub fn is_anonymous(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// Pattern text with metavariables replaced by placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPattern {
    pub text: String,
    pub metavars: Vec<MetaVariable>,
    /// (placeholder start, placeholder end, original start, original end).
    replacements: Vec<(usize, usize, usize, usize)>,
}

impl ScannedPattern {
    /// Maps a byte offset in the substituted text back to the pattern text.
    pub fn original_offset(&self, offset: usize) -> usize {
        let mut delta: isize = 0;
        for &(start, end, orig_start, orig_end) in &self.replacements {
            if offset < start {
                break;
            }
            if offset < end {
                return orig_start;
            }
            delta += (orig_end - orig_start) as isize - (end - start) as isize;
        }
        (offset as isize + delta).max(0) as usize
    }
}

pub fn is_valid_start_char(c: char) -> bool {
    c.is_ascii_uppercase() || c == '_'
}

pub fn is_valid_continuation_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

/// Identifier that stands in for a metavariable while parsing.
pub fn placeholder(name: &str, kind: MetaVarKind) -> String {
    match kind {
        MetaVarKind::Single => format!("{SINGLE_PREFIX}{name}"),
        MetaVarKind::Multi => format!("{MULTI_PREFIX}{name}"),
    }
}

/// Recovers kind and name from a placeholder identifier.
pub fn parse_placeholder(text: &str) -> Option<(MetaVarKind, &str)> {
    let (kind, name) = if let Some(name) = text.strip_prefix(SINGLE_PREFIX) {
        (MetaVarKind::Single, name)
    } else {
        (MetaVarKind::Multi, text.strip_prefix(MULTI_PREFIX)?)
    };
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(is_valid_start_char)
        && chars.all(is_valid_continuation_char);
    valid.then_some((kind, name))
}

/// Replaces every metavariable in `source` with its placeholder.
pub fn scan(source: &str) -> Result<ScannedPattern, InvalidPatternError> {
    let mut text = String::with_capacity(source.len() + 16);
    let mut metavars = Vec::new();
    let mut replacements = Vec::new();
    let mut kinds: HashMap<String, MetaVarKind> = HashMap::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch != '$' {
            text.push(ch);
            continue;
        }

        let mut dollars = 1;
        while chars.peek().is_some_and(|(_, c)| *c == '$') {
            chars.next();
            dollars += 1;
        }

        let name = take_name(&mut chars);
        let end = chars.peek().map_or(source.len(), |(i, _)| *i);

        let kind = match (dollars, name.is_empty()) {
            (1, false) => MetaVarKind::Single,
            (3, _) => MetaVarKind::Multi,
            (_, true) => {
                // Not a metavariable: `$` in JS identifiers, PHP variables.
                text.push_str(&source[offset..end]);
                continue;
            }
            (count, false) => {
                return Err(InvalidPatternError::MetaVariable {
                    offset,
                    message: format!("'{name}' has {count} leading '$', expected 1 or 3"),
                });
            }
        };
        let name = if name.is_empty() {
            ANONYMOUS.to_string()
        } else {
            name
        };

        if !name.starts_with('_') {
            match kinds.get(&name) {
                Some(existing) if *existing != kind => {
                    return Err(InvalidPatternError::KindConflict { name });
                }
                _ => {
                    kinds.insert(name.clone(), kind);
                }
            }
        }

        let start = text.len();
        text.push_str(&placeholder(&name, kind));
        replacements.push((start, text.len(), offset, end));
        metavars.push(MetaVariable { name, kind, offset });
    }

    Ok(ScannedPattern {
        text,
        metavars,
        replacements,
    })
}

fn take_name(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut name = String::new();
    if !chars.peek().is_some_and(|(_, c)| is_valid_start_char(*c)) {
        return name;
    }
    while let Some((_, c)) = chars.peek().copied() {
        if !is_valid_continuation_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pattern: &str) -> Vec<(String, MetaVarKind)> {
        scan(pattern)
            .unwrap()
            .metavars
            .into_iter()
            .map(|m| (m.name, m.kind))
            .collect()
    }

    #[test]
    fn single_and_multi_metavariables() {
        assert_eq!(
            names("$FUNC($$$ARGS, $LAST)"),
            vec![
                ("FUNC".to_string(), MetaVarKind::Single),
                ("ARGS".to_string(), MetaVarKind::Multi),
                ("LAST".to_string(), MetaVarKind::Single),
            ]
        );
    }

    #[test]
    fn placeholders_replace_metavariables() {
        let scanned = scan("$A + $A").unwrap();
        assert_eq!(scanned.text, "__sgmeta1_A + __sgmeta1_A");
    }

    #[test]
    fn bare_triple_dollar_is_anonymous_multi() {
        let scanned = scan("f($$$)").unwrap();
        assert_eq!(scanned.metavars[0].name, "_");
        assert_eq!(scanned.metavars[0].kind, MetaVarKind::Multi);
        assert!(scanned.metavars[0].is_anonymous());
    }

    #[test]
    fn lowercase_dollar_stays_literal() {
        let scanned = scan("$el.show($x)").unwrap();
        assert_eq!(scanned.text, "$el.show($x)");
        assert!(scanned.metavars.is_empty());
    }

    #[test]
    fn double_dollar_is_rejected() {
        let err = scan("foo($$ARGS)").unwrap_err();
        assert!(matches!(err, InvalidPatternError::MetaVariable { offset: 4, .. }));
    }

    #[test]
    fn mixed_kinds_for_one_name_are_rejected() {
        let err = scan("f($X, $$$X)").unwrap_err();
        assert_eq!(err, InvalidPatternError::KindConflict { name: "X".into() });
    }

    #[test]
    fn placeholder_round_trips() {
        let text = placeholder("ARGS", MetaVarKind::Multi);
        assert_eq!(parse_placeholder(&text), Some((MetaVarKind::Multi, "ARGS")));
        assert_eq!(parse_placeholder("__sgmeta1_lower"), None);
        assert_eq!(parse_placeholder("ident"), None);
    }

    #[test]
    fn offsets_map_back_through_placeholders() {
        let scanned = scan("$A + )").unwrap();
        let paren = scanned.text.find(')').unwrap();
        assert_eq!(scanned.original_offset(paren), 5);
        assert_eq!(scanned.original_offset(3), 0);
    }
}
