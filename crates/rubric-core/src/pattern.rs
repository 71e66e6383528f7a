//! Structural node patterns
//!
//! A compact s-expression language for matching syntax tree shapes:
//!
//! - `(kind p1 p2 ...)` node of `kind` whose child slots match `p1 p2 ...`
//! - `kind` any node of `kind`
//! - `_` any slot, present or absent
//! - `nil?` an absent slot
//! - `...` any number of remaining slots (once per node pattern)
//! - `:name` a name slot equal to `name`
//! - `{p1 p2 ...}` any of the alternatives
//! - `$name` capture the slot; when `name` is already bound the slot must
//!   have the same content as the bound value
//!
//! Child counts are exact unless `...` is present.

use crate::syntax::{Child, NodeKind, SyntaxNode};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Node {
        kind: NodeKind,
        children: Vec<Pattern>,
    },
    Kind(NodeKind),
    Wildcard,
    Absent,
    Rest,
    Name(String),
    Alternatives(Vec<Pattern>),
    Capture(String),
}

/// Pattern text that failed to compile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pattern at offset {offset}: {message}")]
pub struct PatternError {
    pub message: String,
    pub offset: usize,
}

/// Value bound to a capture name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Captured<'a> {
    Node(&'a SyntaxNode),
    Name(&'a str),
    Absent,
}

impl<'a> Captured<'a> {
    pub fn as_node(self) -> Option<&'a SyntaxNode> {
        match self {
            Captured::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_name(self) -> Option<&'a str> {
        match self {
            Captured::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Names compare as strings, nodes structurally without positions
    pub fn same_content(self, other: Captured<'_>) -> bool {
        match (self, other) {
            (Captured::Node(a), Captured::Node(b)) => a.same_content(b),
            (Captured::Name(a), Captured::Name(b)) => a == b,
            (Captured::Absent, Captured::Absent) => true,
            _ => false,
        }
    }
}

impl<'a> From<&'a Child> for Captured<'a> {
    fn from(child: &'a Child) -> Self {
        match child {
            Child::Node(node) => Captured::Node(node),
            Child::Name(name) => Captured::Name(name),
            Child::Absent => Captured::Absent,
        }
    }
}

/// Capture bindings of one match, in binding order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures<'a> {
    bindings: Vec<(String, Captured<'a>)>,
}

impl<'a> Captures<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-bind `name`, turning `$name` in a pattern into an equality check
    pub fn with(mut self, name: impl Into<String>, value: Captured<'a>) -> Self {
        self.bind(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<Captured<'a>> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| *value)
    }

    pub fn node(&self, name: &str) -> Option<&'a SyntaxNode> {
        self.get(name).and_then(Captured::as_node)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Captured<'a>)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), *value))
    }

    fn bind(&mut self, name: String, value: Captured<'a>) {
        self.bindings.push((name, value));
    }

    fn truncate(&mut self, len: usize) {
        self.bindings.truncate(len);
    }
}

impl Pattern {
    /// Compile pattern text
    pub fn parse(text: &str) -> Result<Pattern, PatternError> {
        let tokens = tokenize(text);
        let mut parser = PatternParser {
            tokens: &tokens,
            pos: 0,
            end: text.len(),
        };
        let pattern = parser.parse_pattern(false)?;
        if let Some(token) = parser.tokens.get(parser.pos) {
            return Err(PatternError {
                message: format!("unexpected `{}` after pattern", token.text),
                offset: token.offset,
            });
        }
        Ok(pattern)
    }

    /// Match `node`, returning the captures on success
    pub fn matches<'a>(&self, node: &'a SyntaxNode) -> Option<Captures<'a>> {
        self.matches_with(node, Captures::new())
    }

    /// Match `node` with pre-seeded captures
    pub fn matches_with<'a>(
        &self,
        node: &'a SyntaxNode,
        seed: Captures<'a>,
    ) -> Option<Captures<'a>> {
        let mut captures = seed;
        self.match_slot(Captured::Node(node), &mut captures)
            .then_some(captures)
    }

    pub fn is_match(&self, node: &SyntaxNode) -> bool {
        self.matches(node).is_some()
    }

    fn match_slot<'a>(&self, slot: Captured<'a>, captures: &mut Captures<'a>) -> bool {
        match self {
            Pattern::Wildcard | Pattern::Rest => true,
            Pattern::Absent => slot == Captured::Absent,
            Pattern::Name(expected) => slot.as_name() == Some(expected.as_str()),
            Pattern::Kind(kind) => slot.as_node().is_some_and(|node| node.is(*kind)),
            Pattern::Node { kind, children } => match slot {
                Captured::Node(node) if node.is(*kind) => {
                    match_children(children, node.children(), captures)
                }
                _ => false,
            },
            Pattern::Alternatives(alternatives) => alternatives.iter().any(|alternative| {
                let mark = captures.len();
                if alternative.match_slot(slot, captures) {
                    true
                } else {
                    captures.truncate(mark);
                    false
                }
            }),
            Pattern::Capture(name) => match captures.get(name) {
                Some(bound) => bound.same_content(slot),
                None => {
                    captures.bind(name.clone(), slot);
                    true
                }
            },
        }
    }
}

fn match_children<'a>(
    patterns: &[Pattern],
    actuals: &'a [Child],
    captures: &mut Captures<'a>,
) -> bool {
    let rest = patterns.iter().position(|p| matches!(p, Pattern::Rest));
    let (head, tail) = match rest {
        Some(idx) => (&patterns[..idx], &patterns[idx + 1..]),
        None => (patterns, &[][..]),
    };

    let arity_ok = match rest {
        Some(_) => actuals.len() >= head.len() + tail.len(),
        None => actuals.len() == patterns.len(),
    };
    if !arity_ok {
        return false;
    }

    let mark = captures.len();
    let tail_actuals = &actuals[actuals.len() - tail.len()..];
    let matched = head
        .iter()
        .zip(actuals)
        .chain(tail.iter().zip(tail_actuals))
        .all(|(pattern, actual)| pattern.match_slot(Captured::from(actual), captures));
    if !matched {
        captures.truncate(mark);
    }
    matched
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Pattern::parse(text)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_list(f: &mut fmt::Formatter<'_>, items: &[Pattern]) -> fmt::Result {
            for item in items {
                write!(f, " {item}")?;
            }
            Ok(())
        }

        match self {
            Pattern::Node { kind, children } => {
                write!(f, "({kind}")?;
                write_list(f, children)?;
                write!(f, ")")
            }
            Pattern::Kind(kind) => write!(f, "{kind}"),
            Pattern::Wildcard => write!(f, "_"),
            Pattern::Absent => write!(f, "nil?"),
            Pattern::Rest => write!(f, "..."),
            Pattern::Name(name) => write!(f, ":{name}"),
            Pattern::Alternatives(alternatives) => {
                let mut first = true;
                write!(f, "{{")?;
                for alternative in alternatives {
                    if !first {
                        write!(f, " ")?;
                    }
                    first = false;
                    write!(f, "{alternative}")?;
                }
                write!(f, "}}")
            }
            Pattern::Capture(name) => write!(f, "${name}"),
        }
    }
}

// pattern text parsing

#[derive(Debug, Clone, Copy)]
struct Token<'t> {
    text: &'t str,
    offset: usize,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        let delimiter = matches!(ch, '(' | ')' | '{' | '}');
        if ch.is_whitespace() || delimiter {
            if let Some(start) = word_start.take() {
                tokens.push(Token {
                    text: &text[start..idx],
                    offset: start,
                });
            }
            if delimiter {
                tokens.push(Token {
                    text: &text[idx..idx + 1],
                    offset: idx,
                });
            }
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }
    if let Some(start) = word_start {
        tokens.push(Token {
            text: &text[start..],
            offset: start,
        });
    }
    tokens
}

struct PatternParser<'t> {
    tokens: &'t [Token<'t>],
    pos: usize,
    end: usize,
}

impl PatternParser<'_> {
    fn parse_pattern(&mut self, in_node: bool) -> Result<Pattern, PatternError> {
        let Some(token) = self.tokens.get(self.pos).copied() else {
            return Err(self.error("unexpected end of pattern", self.end));
        };
        self.pos += 1;

        match token.text {
            "(" => self.parse_node(token),
            "{" => self.parse_alternatives(token),
            ")" | "}" => Err(self.error(format!("unexpected `{}`", token.text), token.offset)),
            "_" => Ok(Pattern::Wildcard),
            "nil?" => Ok(Pattern::Absent),
            "..." if in_node => Ok(Pattern::Rest),
            "..." => Err(self.error(
                "`...` is only allowed among the children of a node pattern",
                token.offset,
            )),
            text => {
                if let Some(name) = text.strip_prefix(':') {
                    return self.non_empty(name, token).map(|n| Pattern::Name(n.to_string()));
                }
                if let Some(name) = text.strip_prefix('$') {
                    return self
                        .non_empty(name, token)
                        .map(|n| Pattern::Capture(n.to_string()));
                }
                self.kind(token).map(Pattern::Kind)
            }
        }
    }

    fn parse_node(&mut self, open: Token<'_>) -> Result<Pattern, PatternError> {
        let Some(head) = self.tokens.get(self.pos).copied() else {
            return Err(self.error("unclosed `(`", open.offset));
        };
        self.pos += 1;
        let kind = self.kind(head)?;

        let mut children = Vec::new();
        let mut rest_seen = false;
        loop {
            match self.tokens.get(self.pos) {
                None => return Err(self.error("unclosed `(`", open.offset)),
                Some(token) if token.text == ")" => {
                    self.pos += 1;
                    break;
                }
                Some(token) => {
                    let offset = token.offset;
                    let child = self.parse_pattern(true)?;
                    if child == Pattern::Rest {
                        if rest_seen {
                            return Err(self.error("only one `...` is allowed per node", offset));
                        }
                        rest_seen = true;
                    }
                    children.push(child);
                }
            }
        }
        Ok(Pattern::Node { kind, children })
    }

    fn parse_alternatives(&mut self, open: Token<'_>) -> Result<Pattern, PatternError> {
        let mut alternatives = Vec::new();
        loop {
            match self.tokens.get(self.pos) {
                None => return Err(self.error("unclosed `{`", open.offset)),
                Some(token) if token.text == "}" => {
                    self.pos += 1;
                    break;
                }
                Some(_) => alternatives.push(self.parse_pattern(false)?),
            }
        }
        if alternatives.is_empty() {
            return Err(self.error("empty alternatives", open.offset));
        }
        Ok(Pattern::Alternatives(alternatives))
    }

    fn kind(&self, token: Token<'_>) -> Result<NodeKind, PatternError> {
        NodeKind::from_name(token.text).ok_or_else(|| {
            self.error(format!("unknown node kind `{}`", token.text), token.offset)
        })
    }

    fn non_empty<'n>(&self, name: &'n str, token: Token<'_>) -> Result<&'n str, PatternError> {
        if name.is_empty() {
            Err(self.error(format!("missing name after `{}`", token.text), token.offset))
        } else {
            Ok(name)
        }
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> PatternError {
        PatternError {
            message: message.into(),
            offset,
        }
    }
}
