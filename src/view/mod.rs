//! Tree to text and back: the editable representation boundary.
//!
//! The codec core does not own a display surface; it hands a rendered
//! text form to the host and receives edited text back. The contract is
//! the [`EditableView`] trait: rendering must be lossless for every
//! [`GraphNode`] variant including back-references and null, and parsing
//! must reject anything that does not map to a well-formed tree with an
//! error the session can surface.
//!
//! [`TextView`] is the production implementation, a line-oriented grammar:
//!
//! ```text
//! object com.example.User &0 {
//!   login: string "bob"
//!   age: int 42
//!   tags: array java.lang.String &1 [
//!     string "a\nb"
//!     null
//!   ]
//!   this: ref &0
//! }
//! ```
//!
//! - `&N` labels name objects and arrays; `ref &N` aliases the node so
//!   labeled, expressing shared substructure and cycles.
//! - Primitive values are a kind keyword and a literal: `int 42`,
//!   `boolean true`, `double 2.5`, `char 65`.
//! - String literals escape `\" \\ \n \r \t` and arbitrary bytes as
//!   `\xNN`, so a value containing a newline never puts a raw newline in
//!   the edit buffer. Non-UTF-8 byte runs render entirely via `\xNN`.
//! - Indentation is cosmetic; tokens are whitespace separated.

mod parse;
mod render;

use crate::error::ParseError;
use crate::graph::GraphNode;

/// A bidirectional mapping between trees and structured text.
pub trait EditableView: std::fmt::Debug {
    /// Renders a tree into its text form. Total and lossless.
    fn render(&self, tree: &GraphNode) -> String;

    /// Parses edited text back into a tree.
    fn parse(&self, text: &str) -> Result<GraphNode, ParseError>;
}

/// The built-in line-oriented text grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextView;

impl EditableView for TextView {
    fn render(&self, tree: &GraphNode) -> String {
        render::render_tree(tree)
    }

    fn parse(&self, text: &str) -> Result<GraphNode, ParseError> {
        parse::parse_tree(text)
    }
}
