use crate::grammar::{ErrorPolicy, Grammar, Language};
use crate::pool;
use crate::tree::errors::ParseError;
use crate::tree::node::SyntaxTree;
use std::sync::Arc;
use tracing::debug;

/// Parses `source` with `grammar`, honouring the grammar's [`ErrorPolicy`].
pub fn parse(source: &str, grammar: &dyn Grammar) -> Result<SyntaxTree, ParseError> {
    parse_with_policy(source, grammar, grammar.error_policy())
}

/// Parses `source`, failing on any error marker regardless of the grammar's
/// policy. Used for patterns, which must be well-formed.
pub(crate) fn parse_strict(source: &str, grammar: &dyn Grammar) -> Result<SyntaxTree, ParseError> {
    parse_with_policy(source, grammar, ErrorPolicy::Strict)
}

pub(crate) fn parse_with_policy(
    source: &str,
    grammar: &dyn Grammar,
    policy: ErrorPolicy,
) -> Result<SyntaxTree, ParseError> {
    let language = grammar.language();
    let ts_tree = pool::with_parser(grammar, |parser| parser.parse(source, None))?.ok_or_else(
        || ParseError::Aborted {
            language: language.to_string(),
        },
    )?;

    let tree = SyntaxTree::from_ts_tree(&ts_tree, source.to_string(), language.clone());

    if let Some(error) = tree.first_error() {
        debug!(
            language = %language,
            offset = error.byte_range().start,
            "parsed tree contains error markers"
        );
        if policy == ErrorPolicy::Strict {
            let start = error.start_position();
            return Err(ParseError::Syntax {
                language: language.to_string(),
                offset: error.byte_range().start,
                line: start.line,
                column: start.column,
            });
        }
    }

    Ok(tree)
}

/// The parser capability handed out by the registry for one language.
#[derive(Clone)]
pub struct SourceParser {
    grammar: Arc<dyn Grammar>,
}

impl SourceParser {
    pub fn new(grammar: Arc<dyn Grammar>) -> Self {
        Self { grammar }
    }

    pub fn language(&self) -> &Language {
        self.grammar.language()
    }

    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    pub fn parse(&self, source: &str) -> Result<SyntaxTree, ParseError> {
        parse(source, self.grammar.as_ref())
    }
}
