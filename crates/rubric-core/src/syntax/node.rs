//! Immutable syntax tree nodes

use super::NodeKind;
use biome_text_size::{TextRange, TextSize};
use std::fmt::Write as _;

/// One child slot of a node
///
/// Slots are positional and their meaning depends on the parent kind, e.g. a
/// `send` node is `[receiver, method name, arguments...]` where the receiver
/// may be absent and the method name is a [`Child::Name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// A nested node
    Node(SyntaxNode),
    /// A name or literal value (method name, variable name, string contents)
    Name(String),
    /// An optional slot that is not present
    Absent,
}

impl Child {
    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Child::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Structural equality that ignores source positions
    pub fn same_content(&self, other: &Child) -> bool {
        match (self, other) {
            (Child::Node(a), Child::Node(b)) => a.same_content(b),
            (Child::Name(a), Child::Name(b)) => a == b,
            (Child::Absent, Child::Absent) => true,
            _ => false,
        }
    }
}

impl From<SyntaxNode> for Child {
    fn from(node: SyntaxNode) -> Self {
        Child::Node(node)
    }
}

impl From<Option<SyntaxNode>> for Child {
    fn from(node: Option<SyntaxNode>) -> Self {
        node.map_or(Child::Absent, Child::Node)
    }
}

/// A node of the parsed tree
///
/// Created once by the parser and never mutated afterwards. `range` covers the
/// node's source text; `selector` is set on calls and definitions and covers
/// the method name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: NodeKind,
    children: Vec<Child>,
    range: TextRange,
    selector: Option<TextRange>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, range: TextRange, children: Vec<Child>) -> Self {
        Self {
            kind,
            children,
            range,
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: TextRange) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn selector(&self) -> Option<TextRange> {
        self.selector
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Present node children, in slot order
    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter_map(Child::as_node)
    }

    pub fn child_node(&self, index: usize) -> Option<&SyntaxNode> {
        self.children.get(index).and_then(Child::as_node)
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.children.get(index).and_then(Child::as_name)
    }

    /// Source text covered by this node
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        slice(source, self.range)
    }

    /// Kind and children equal, ignoring source positions
    pub fn same_content(&self, other: &SyntaxNode) -> bool {
        self.kind == other.kind
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_content(b))
    }

    // send, csend

    pub fn receiver(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Send | NodeKind::Csend => self.child_node(0),
            _ => None,
        }
    }

    pub fn method_name(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Send | NodeKind::Csend => self.name_at(1),
            NodeKind::Def => self.name_at(0),
            _ => None,
        }
    }

    pub fn arguments(&self) -> &[Child] {
        match self.kind {
            NodeKind::Send | NodeKind::Csend => self.children.get(2..).unwrap_or(&[]),
            NodeKind::Return => &self.children,
            _ => &[],
        }
    }

    // const

    /// Fully qualified constant name; a leading `::` is dropped
    pub fn const_name(&self) -> Option<String> {
        if self.kind != NodeKind::Const {
            return None;
        }
        let short = self.name_at(1)?;
        match self.child_node(0) {
            Some(scope) if scope.is(NodeKind::Const) => {
                Some(format!("{}::{}", scope.const_name()?, short))
            }
            Some(scope) if scope.is(NodeKind::Cbase) => Some(short.to_string()),
            Some(_) => None,
            None => Some(short.to_string()),
        }
    }

    // resbody

    /// Exception class list of a rescue clause (`array` node)
    pub fn exceptions(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Resbody => self.child_node(0),
            _ => None,
        }
    }

    /// `=> e` binding of a rescue clause (`lvasgn` node)
    pub fn exception_variable(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Resbody => self.child_node(1),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Resbody => self.child_node(2),
            NodeKind::Def => self.child_node(2),
            NodeKind::Kwbegin => self.child_node(0),
            _ => None,
        }
    }

    /// Name of a variable read or write
    pub fn variable_name(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Lvar | NodeKind::Lvasgn | NodeKind::Ivar | NodeKind::Ivasgn => {
                self.name_at(0)
            }
            _ => None,
        }
    }

    /// Render as a `parser`-gem style s-expression
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        out.push('(');
        out.push_str(self.kind.as_str());
        for child in &self.children {
            out.push(' ');
            match child {
                Child::Node(node) => node.write_sexp(out),
                Child::Absent => out.push_str("nil"),
                Child::Name(name) => match self.kind {
                    NodeKind::Str => {
                        let _ = write!(out, "{name:?}");
                    }
                    NodeKind::Int | NodeKind::Float => out.push_str(name),
                    _ => {
                        out.push(':');
                        out.push_str(name);
                    }
                },
            }
        }
        out.push(')');
    }
}

/// Build a range from byte offsets
pub fn text_range(start: usize, end: usize) -> TextRange {
    TextRange::new(text_size(start), text_size(end))
}

/// Convert a byte offset, saturating at `u32::MAX`
pub fn text_size(offset: usize) -> TextSize {
    TextSize::from(u32::try_from(offset).unwrap_or(u32::MAX))
}

/// Slice `source` by a range; out-of-bounds ranges yield an empty string
pub fn slice(source: &str, range: TextRange) -> &str {
    let start = usize::from(range.start());
    let end = usize::from(range.end());
    source.get(start..end).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_node(kind: NodeKind, name: &str, start: usize) -> SyntaxNode {
        SyntaxNode::new(
            kind,
            text_range(start, start + name.len()),
            vec![Child::Name(name.to_string())],
        )
    }

    fn constant(scope: Option<SyntaxNode>, name: &str, start: usize, end: usize) -> SyntaxNode {
        SyntaxNode::new(
            NodeKind::Const,
            text_range(start, end),
            vec![scope.into(), Child::Name(name.to_string())],
        )
    }

    #[test]
    fn test_const_name_strips_cbase() {
        let cbase = SyntaxNode::new(NodeKind::Cbase, text_range(0, 2), vec![]);
        let node = constant(Some(cbase), "Exception", 0, 11);
        assert_eq!(node.const_name().as_deref(), Some("Exception"));
    }

    #[test]
    fn test_const_name_keeps_namespace() {
        let scope = constant(None, "Foo", 0, 3);
        let node = constant(Some(scope), "Exception", 0, 14);
        assert_eq!(node.const_name().as_deref(), Some("Foo::Exception"));
    }

    #[test]
    fn test_same_content_ignores_positions() {
        let a = name_node(NodeKind::Lvar, "e", 0);
        let b = name_node(NodeKind::Lvar, "e", 40);
        let c = name_node(NodeKind::Lvar, "err", 0);
        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
    }

    #[test]
    fn test_text_and_sexp() {
        let source = "x.to_s";
        let recv = SyntaxNode::new(
            NodeKind::Send,
            text_range(0, 1),
            vec![Child::Absent, Child::Name("x".into())],
        )
        .with_selector(text_range(0, 1));
        let call = SyntaxNode::new(
            NodeKind::Send,
            text_range(0, 6),
            vec![recv.into(), Child::Name("to_s".into())],
        )
        .with_selector(text_range(2, 6));

        assert_eq!(call.text(source), "x.to_s");
        assert_eq!(call.receiver().map(|r| r.text(source)), Some("x"));
        assert_eq!(call.method_name(), Some("to_s"));
        assert!(call.arguments().is_empty());
        assert_eq!(call.to_sexp(), "(send (send nil :x) :to_s)");
    }
}
