//! Language-agnostic syntax trees.
//!
//! A tree-sitter parse is copied into an arena of nodes in pre-order so
//! that parent links are plain indices and a node's descendants form a
//! contiguous id range. Trees are immutable once built and own their source
//! text.

pub mod errors;
pub mod node;
pub mod parser;

pub use errors::ParseError;
pub use node::{Ancestors, Descendants, NodeId, Position, SyntaxNode, SyntaxTree};
pub use parser::{parse, SourceParser};
