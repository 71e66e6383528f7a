//! Ruby syntax tree
//!
//! A subset parser producing an immutable tree whose node kinds and child
//! layout follow the `parser` gem, so that structural patterns read like
//! the s-expressions Ruby tooling prints.

mod kind;
mod lexer;
mod node;
mod parser;

pub use kind::NodeKind;
pub use lexer::{Cursor, KEYWORDS};
pub use node::{Child, SyntaxNode, slice, text_range, text_size};
pub use parser::{SyntaxTree, parse_ruby};
