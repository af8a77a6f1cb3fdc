//! Textual syntax tree dumps for pattern debugging.
//!
//! One line per node, indented two spaces per depth:
//!
//! ```text
//! module (0,0)-(1,0)
//!   expression_statement (0,0)-(0,4)
//!     call (0,0)-(0,4)
//!       function: identifier (0,0)-(0,1) `f`
//!       arguments: argument_list (0,1)-(0,4)
//!         "(" (0,1)-(0,2) `(`
//! ```
//!
//! The output depends only on the source text and the grammar.

use crate::error::Error;
use crate::grammar::{GrammarRegistry, Language};
use crate::pattern::{MetaVarKind, Pattern};
use crate::tree::{parse, SyntaxNode};
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// Every node, anonymous tokens included.
    #[default]
    Cst,
    /// Named nodes only.
    Ast,
    /// The code read as a pattern, with metavariables marked.
    Pattern,
}

impl FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cst" => Ok(DumpFormat::Cst),
            "ast" => Ok(DumpFormat::Ast),
            "pattern" => Ok(DumpFormat::Pattern),
            other => Err(format!("unknown dump format '{other}' (expected cst, ast or pattern)")),
        }
    }
}

/// Renders `code` parsed as `language`.
///
/// `Cst` and `Ast` parse `code` as a file, so they fail only where parsing
/// fails. `Pattern` compiles `code` as a pattern and fails like pattern
/// compilation; its lines carry no positions because the pattern is
/// parsed with placeholders in place of metavariables.
pub fn render_tree(
    registry: &GrammarRegistry,
    code: &str,
    language: &Language,
    format: DumpFormat,
) -> Result<String, Error> {
    let grammar = registry.grammar(language)?;
    match format {
        DumpFormat::Cst | DumpFormat::Ast => {
            let tree = parse(code, grammar.as_ref())?;
            Ok(render_node(tree.root(), format == DumpFormat::Ast))
        }
        DumpFormat::Pattern => {
            let pattern = Pattern::new(code, grammar.as_ref())?;
            Ok(render_pattern(&pattern))
        }
    }
}

fn render_node(root: SyntaxNode<'_>, named_only: bool) -> String {
    let mut out = String::new();
    let mut stack = vec![(root, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        let children: Vec<_> = if named_only {
            node.named_children().collect()
        } else {
            node.children().collect()
        };

        write_head(&mut out, node, depth);
        let _ = write!(out, " {}-{}", node.start_position(), node.end_position());
        if children.is_empty() {
            write_text(&mut out, node.text());
        }
        out.push('\n');

        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
    out
}

fn render_pattern(pattern: &Pattern) -> String {
    let mut out = String::new();
    let mut stack = vec![(pattern.root(), 0usize)];

    while let Some((node, depth)) = stack.pop() {
        if let Some((kind, name)) = pattern.metavar_at(node) {
            indent(&mut out, depth, node);
            match kind {
                MetaVarKind::Single => {
                    let _ = writeln!(out, "${name}");
                }
                MetaVarKind::Multi => {
                    let _ = writeln!(out, "$$${name}");
                }
            }
            continue;
        }

        write_head(&mut out, node, depth);
        if node.child_count() == 0 {
            write_text(&mut out, node.text());
        }
        out.push('\n');

        stack.extend(node.children().rev().map(|child| (child, depth + 1)));
    }
    out
}

fn indent(out: &mut String, depth: usize, node: SyntaxNode<'_>) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    if let Some(field) = node.field_name() {
        out.push_str(field);
        out.push_str(": ");
    }
}

fn write_head(out: &mut String, node: SyntaxNode<'_>, depth: usize) {
    indent(out, depth, node);
    if node.is_named() {
        out.push_str(node.kind());
    } else {
        let _ = write!(out, "{:?}", node.kind());
    }
}

fn write_text(out: &mut String, text: &str) {
    out.push_str(" `");
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch => out.push(ch),
        }
    }
    out.push('`');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn dump(code: &str, language: &str, format: DumpFormat) -> String {
        let registry = GrammarRegistry::builtin();
        let language = registry.resolve(language).unwrap();
        render_tree(&registry, code, &language, format).unwrap()
    }

    #[test]
    fn cst_shows_tokens_fields_and_text() {
        let out = dump("f(1)\n", "python", DumpFormat::Cst);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "module (0,0)-(1,0)");
        assert_eq!(lines[1], "  expression_statement (0,0)-(0,4)");
        assert_eq!(lines[2], "    call (0,0)-(0,4)");
        assert_eq!(lines[3], "      function: identifier (0,0)-(0,1) `f`");
        assert_eq!(lines[4], "      arguments: argument_list (0,1)-(0,4)");
        assert_eq!(lines[5], "        \"(\" (0,1)-(0,2) `(`");
        assert_eq!(lines[6], "        integer (0,2)-(0,3) `1`");
        assert_eq!(lines[7], "        \")\" (0,3)-(0,4) `)`");
    }

    #[test]
    fn ast_hides_anonymous_tokens() {
        let out = dump("f(1)\n", "python", DumpFormat::Ast);
        assert!(!out.contains("\"(\""));
        assert!(out.contains("        integer (0,2)-(0,3) `1`"));
    }

    #[test]
    fn pattern_marks_metavariables() {
        let out = dump("$F($$$ARGS)", "python", DumpFormat::Pattern);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "call");
        assert_eq!(lines[1], "  function: $F");
        assert!(out.contains("$$$ARGS"));
        assert!(!out.contains("__sgmeta"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let code = "class A:\n    def m(self):\n        return [x for x in y]  # note\n";
        assert_eq!(
            dump(code, "python", DumpFormat::Cst),
            dump(code, "python", DumpFormat::Cst)
        );
    }

    #[test]
    fn unknown_language_fails_before_parsing() {
        let registry = GrammarRegistry::builtin();
        let err = registry.resolve("cobol").unwrap_err();
        assert_eq!(Error::from(err).kind(), ErrorKind::UnsupportedLanguage);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let registry = GrammarRegistry::builtin();
        let python = registry.resolve("python").unwrap();
        let err = render_tree(&registry, "def (", &python, DumpFormat::Pattern).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPattern);
    }
}
