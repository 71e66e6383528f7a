//! Node kinds produced by the Ruby parser

use std::fmt;

/// Kind tag of a [`SyntaxNode`](super::SyntaxNode)
///
/// The set is closed: it is exactly what the parser can produce. Names follow
/// the `parser` gem s-expression vocabulary so patterns read the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Sequence of statements (`(a; b)`, bodies with more than one statement)
    Begin,
    /// Explicit `begin ... end` block
    Kwbegin,
    /// Body protected by one or more rescue clauses
    Rescue,
    /// A single `rescue` clause: exception list, bound variable, body
    Resbody,
    /// Body with an `ensure` section
    Ensure,
    Array,
    /// Constant reference with optional scope
    Const,
    /// Top-level constant scope (`::Foo`)
    Cbase,
    /// Method call: receiver, method name, arguments
    Send,
    /// Safe-navigation call (`x&.name`), same slots as `send`
    Csend,
    And,
    Or,
    /// Local variable read
    Lvar,
    /// Local variable assignment (also the `=> e` binding of a rescue clause)
    Lvasgn,
    Ivar,
    Ivasgn,
    Str,
    /// String literal with interpolation
    Dstr,
    /// Symbol literal with interpolation
    Dsym,
    Sym,
    Regexp,
    Regopt,
    /// Backtick command literal
    Xstr,
    /// `#{...}` segment inside a quoted literal
    Interpolation,
    Int,
    Float,
    Nil,
    True,
    False,
    SelfRef,
    If,
    Def,
    Args,
    Arg,
    Return,
}

impl NodeKind {
    /// All kinds, in declaration order
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Begin,
        NodeKind::Kwbegin,
        NodeKind::Rescue,
        NodeKind::Resbody,
        NodeKind::Ensure,
        NodeKind::Array,
        NodeKind::Const,
        NodeKind::Cbase,
        NodeKind::Send,
        NodeKind::Csend,
        NodeKind::And,
        NodeKind::Or,
        NodeKind::Lvar,
        NodeKind::Lvasgn,
        NodeKind::Ivar,
        NodeKind::Ivasgn,
        NodeKind::Str,
        NodeKind::Dstr,
        NodeKind::Dsym,
        NodeKind::Sym,
        NodeKind::Regexp,
        NodeKind::Regopt,
        NodeKind::Xstr,
        NodeKind::Interpolation,
        NodeKind::Int,
        NodeKind::Float,
        NodeKind::Nil,
        NodeKind::True,
        NodeKind::False,
        NodeKind::SelfRef,
        NodeKind::If,
        NodeKind::Def,
        NodeKind::Args,
        NodeKind::Arg,
        NodeKind::Return,
    ];

    /// Name used in s-expressions and patterns
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Begin => "begin",
            NodeKind::Kwbegin => "kwbegin",
            NodeKind::Rescue => "rescue",
            NodeKind::Resbody => "resbody",
            NodeKind::Ensure => "ensure",
            NodeKind::Array => "array",
            NodeKind::Const => "const",
            NodeKind::Cbase => "cbase",
            NodeKind::Send => "send",
            NodeKind::Csend => "csend",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Lvar => "lvar",
            NodeKind::Lvasgn => "lvasgn",
            NodeKind::Ivar => "ivar",
            NodeKind::Ivasgn => "ivasgn",
            NodeKind::Str => "str",
            NodeKind::Dstr => "dstr",
            NodeKind::Dsym => "dsym",
            NodeKind::Sym => "sym",
            NodeKind::Regexp => "regexp",
            NodeKind::Regopt => "regopt",
            NodeKind::Xstr => "xstr",
            NodeKind::Interpolation => "interpolation",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::Nil => "nil",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::SelfRef => "self",
            NodeKind::If => "if",
            NodeKind::Def => "def",
            NodeKind::Args => "args",
            NodeKind::Arg => "arg",
            NodeKind::Return => "return",
        }
    }

    /// Look up a kind by its s-expression name
    pub fn from_name(name: &str) -> Option<NodeKind> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }

    /// Quoted literals that may contain interpolation segments
    pub fn is_interpolating_literal(self) -> bool {
        matches!(
            self,
            NodeKind::Dstr | NodeKind::Dsym | NodeKind::Regexp | NodeKind::Xstr
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.as_str()), Some(*kind));
        }
        assert_eq!(NodeKind::from_name("block"), None);
    }
}
