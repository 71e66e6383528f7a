//! Recursive-descent parser for the Ruby subset rubric analyzes
//!
//! Covers statements and modifiers, method calls with and without receivers
//! (parenthesized or command style), constants and `::` paths, local and
//! instance variables, literals including interpolated strings, symbols,
//! regexps and backticks, `begin/rescue/else/ensure/end`, `def` and `if`.
//! Anything outside the subset is a parse error; there is no recovery.

use super::lexer::{Cursor, KEYWORDS, is_constant, is_ident_start};
use super::node::{Child, SyntaxNode, text_range, text_size};
use super::NodeKind;
use crate::{Result, RubricError};
use biome_text_size::TextRange;
use std::collections::HashSet;

/// Binary operators by precedence, longest spelling first within a prefix
const BINARY_OPERATORS: &[(&str, u8)] = &[
    ("||", 1),
    ("&&", 2),
    ("<=>", 3),
    ("==", 3),
    ("!=", 3),
    ("=~", 3),
    ("!~", 3),
    ("<=", 4),
    (">=", 4),
    ("<", 4),
    (">", 4),
    ("+", 5),
    ("-", 5),
    ("*", 6),
    ("/", 6),
    ("%", 6),
];

/// Keywords that end a body inside `begin`/`def`
const BODY_END: &[&str] = &["rescue", "else", "ensure", "end"];

/// Keywords allowed as the first token of a command argument
const ARGUMENT_KEYWORDS: &[&str] = &["self", "nil", "true", "false", "begin", "not"];

/// Parsed source together with its tree
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    root: Option<SyntaxNode>,
    source: String,
}

impl SyntaxTree {
    /// Parse Ruby source into a tree
    pub fn parse(source: &str) -> Result<Self> {
        let root = parse_ruby(source)?;
        Ok(Self {
            root,
            source: source.to_string(),
        })
    }

    /// Root node; `None` for a program without statements
    pub fn root(&self) -> Option<&SyntaxNode> {
        self.root.as_ref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parse Ruby source, returning the top-level statement (sequence)
pub fn parse_ruby(source: &str) -> Result<Option<SyntaxNode>> {
    if u32::try_from(source.len()).is_err() {
        return Err(RubricError::parse_error(
            "source is larger than 4 GiB",
            source,
            0,
        ));
    }

    let mut parser = Parser::new(source);
    let statements = parser.parse_statements(Stop::Eof)?;
    Ok(sequence(statements))
}

/// Where a statement list ends
#[derive(Debug, Clone, Copy)]
enum Stop {
    Eof,
    Keywords(&'static [&'static str]),
    Char(char),
}

struct Parser<'s> {
    cursor: Cursor<'s>,
    /// Local variable scopes; `def` opens a fresh one
    scopes: Vec<HashSet<&'s str>>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            cursor: Cursor::new(source),
            scopes: vec![HashSet::new()],
        }
    }

    // statements

    fn parse_statements(&mut self, stop: Stop) -> Result<Vec<SyntaxNode>> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if self.cursor.at_end() || self.at_stop(stop) {
                break;
            }
            statements.push(self.parse_statement()?);

            self.cursor.skip_horizontal_trivia();
            match self.cursor.peek() {
                None | Some('\n' | ';') => {}
                _ if self.at_stop(stop) => {}
                _ => return Err(self.unexpected()),
            }
        }
        Ok(statements)
    }

    fn skip_separators(&mut self) {
        loop {
            self.cursor.skip_trivia();
            if !self.cursor.eat(";") {
                break;
            }
        }
    }

    fn at_stop(&self, stop: Stop) -> bool {
        match stop {
            Stop::Eof => false,
            Stop::Keywords(keywords) => self
                .cursor
                .peek_keyword()
                .is_some_and(|keyword| keywords.contains(&keyword)),
            Stop::Char(ch) => self.cursor.peek() == Some(ch),
        }
    }

    fn parse_statement(&mut self) -> Result<SyntaxNode> {
        let mut statement = self.parse_expression(true)?;

        // `a and b`, `a or b`
        loop {
            let checkpoint = self.cursor.clone();
            self.cursor.skip_horizontal_trivia();
            let kind = if self.cursor.eat_keyword("and") {
                NodeKind::And
            } else if self.cursor.eat_keyword("or") {
                NodeKind::Or
            } else {
                self.cursor = checkpoint;
                break;
            };
            self.cursor.skip_trivia();
            let rhs = self.parse_expression(true)?;
            statement = SyntaxNode::new(
                kind,
                cover(&statement, &rhs),
                vec![statement.into(), rhs.into()],
            );
        }

        // `stmt if cond`, `stmt unless cond`
        loop {
            let checkpoint = self.cursor.clone();
            self.cursor.skip_horizontal_trivia();
            let negate = if self.cursor.eat_keyword("if") {
                false
            } else if self.cursor.eat_keyword("unless") {
                true
            } else {
                self.cursor = checkpoint;
                break;
            };
            let condition = self.parse_expression(false)?;
            let range = cover(&statement, &condition);
            let (then_branch, else_branch) = if negate {
                (Child::Absent, Child::Node(statement))
            } else {
                (Child::Node(statement), Child::Absent)
            };
            statement = SyntaxNode::new(
                NodeKind::If,
                range,
                vec![condition.into(), then_branch, else_branch],
            );
        }

        Ok(statement)
    }

    // expressions

    fn parse_expression(&mut self, command: bool) -> Result<SyntaxNode> {
        self.cursor.skip_horizontal_trivia();
        if let Some(assignment) = self.try_parse_assignment(command)? {
            return Ok(assignment);
        }
        self.parse_binary(1, command)
    }

    fn try_parse_assignment(&mut self, command: bool) -> Result<Option<SyntaxNode>> {
        let checkpoint = self.cursor.clone();
        let start = self.cursor.pos();
        let instance = self.cursor.eat("@");

        let assignable = self.cursor.peek_identifier().filter(|name| {
            !is_constant(name)
                && (instance || !KEYWORDS.contains(name))
                && !name.ends_with(['?', '!'])
        });
        if assignable.is_none() {
            self.cursor = checkpoint;
            return Ok(None);
        }
        self.cursor.eat_identifier();
        let name = &self.cursor.source()[start..self.cursor.pos()];

        self.cursor.skip_horizontal_trivia();
        let is_assignment = self.cursor.starts_with("=")
            && !self.cursor.starts_with("==")
            && !self.cursor.starts_with("=>")
            && !self.cursor.starts_with("=~");
        if !is_assignment {
            self.cursor = checkpoint;
            return Ok(None);
        }
        self.cursor.eat("=");
        self.cursor.skip_trivia();

        let kind = if instance {
            NodeKind::Ivasgn
        } else {
            self.declare(name);
            NodeKind::Lvasgn
        };
        let value = self.parse_expression(command)?;
        let range = TextRange::new(text_size(start), value.range().end());
        Ok(Some(SyntaxNode::new(
            kind,
            range,
            vec![Child::Name(name.to_string()), value.into()],
        )))
    }

    fn parse_binary(&mut self, min_precedence: u8, command: bool) -> Result<SyntaxNode> {
        let mut lhs = self.parse_unary(command)?;
        loop {
            let checkpoint = self.cursor.clone();
            self.cursor.skip_horizontal_trivia();
            let Some((operator, precedence)) = self.peek_operator() else {
                self.cursor = checkpoint;
                break;
            };
            if precedence < min_precedence {
                self.cursor = checkpoint;
                break;
            }

            let operator_start = self.cursor.pos();
            self.cursor.eat(operator);
            let selector = text_range(operator_start, self.cursor.pos());
            self.cursor.skip_trivia();
            let rhs = self.parse_binary(precedence + 1, false)?;
            let range = cover(&lhs, &rhs);

            lhs = match operator {
                "&&" => SyntaxNode::new(NodeKind::And, range, vec![lhs.into(), rhs.into()]),
                "||" => SyntaxNode::new(NodeKind::Or, range, vec![lhs.into(), rhs.into()]),
                _ => SyntaxNode::new(
                    NodeKind::Send,
                    range,
                    vec![lhs.into(), Child::Name(operator.to_string()), rhs.into()],
                )
                .with_selector(selector),
            };
        }
        Ok(lhs)
    }

    fn peek_operator(&self) -> Option<(&'static str, u8)> {
        BINARY_OPERATORS
            .iter()
            .copied()
            .find(|(operator, _)| self.cursor.starts_with(operator))
    }

    fn parse_unary(&mut self, command: bool) -> Result<SyntaxNode> {
        self.cursor.skip_horizontal_trivia();
        if self.cursor.peek() == Some('!') && !matches!(self.cursor.peek_nth(1), Some('=' | '~'))
        {
            let start = self.cursor.pos();
            self.cursor.bump();
            let selector = text_range(start, self.cursor.pos());
            let operand = self.parse_unary(false)?;
            let range = TextRange::new(selector.start(), operand.range().end());
            return Ok(SyntaxNode::new(
                NodeKind::Send,
                range,
                vec![operand.into(), Child::Name("!".to_string())],
            )
            .with_selector(selector));
        }
        self.parse_postfix(command)
    }

    fn parse_postfix(&mut self, command: bool) -> Result<SyntaxNode> {
        let mut node = self.parse_primary(command)?;
        loop {
            // `.name` / `&.name`, possibly on the next line
            let checkpoint = self.cursor.clone();
            self.cursor.skip_trivia();
            let call_kind = if self.cursor.eat("&.") {
                Some(NodeKind::Csend)
            } else if self.cursor.starts_with(".") && !self.cursor.starts_with("..") {
                self.cursor.eat(".");
                Some(NodeKind::Send)
            } else {
                None
            };
            if let Some(kind) = call_kind {
                self.cursor.skip_trivia();
                node = self.parse_method_call(kind, node, command)?;
                continue;
            }
            self.cursor = checkpoint;

            if self.cursor.starts_with("::") {
                self.cursor.eat("::");
                match self.cursor.peek_identifier() {
                    Some(name)
                        if is_constant(name)
                            && self.cursor.peek_nth(name.chars().count()) != Some('(') =>
                    {
                        self.cursor.eat_identifier();
                        let range = TextRange::new(
                            node.range().start(),
                            text_size(self.cursor.pos()),
                        );
                        node = SyntaxNode::new(
                            NodeKind::Const,
                            range,
                            vec![node.into(), Child::Name(name.to_string())],
                        );
                    }
                    Some(_) => node = self.parse_method_call(NodeKind::Send, node, command)?,
                    None => return Err(self.unexpected()),
                }
                continue;
            }

            if self.cursor.peek() == Some('[')
                && !matches!(self.cursor.prev(), Some(' ' | '\t'))
            {
                let open = self.cursor.pos();
                self.cursor.bump();
                let arguments = self.parse_list(']')?;
                let selector = text_range(open, self.cursor.pos());
                let range = TextRange::new(node.range().start(), selector.end());
                let mut children = vec![node.into(), Child::Name("[]".to_string())];
                children.extend(arguments.into_iter().map(Child::Node));
                node = SyntaxNode::new(NodeKind::Send, range, children).with_selector(selector);
                continue;
            }

            break;
        }
        Ok(node)
    }

    /// Method name and arguments after `.`, `&.` or `::`
    ///
    /// `kind` is `csend` for safe navigation and `send` otherwise.
    fn parse_method_call(
        &mut self,
        kind: NodeKind,
        receiver: SyntaxNode,
        command: bool,
    ) -> Result<SyntaxNode> {
        let selector_start = self.cursor.pos();
        let Some(name) = self.cursor.eat_identifier() else {
            return Err(self.unexpected());
        };
        let selector = text_range(selector_start, self.cursor.pos());
        let (arguments, arguments_end) = self.parse_call_arguments(command)?;

        let end = arguments_end.map_or(selector.end(), text_size);
        let range = TextRange::new(receiver.range().start(), end);
        let mut children = vec![receiver.into(), Child::Name(name.to_string())];
        children.extend(arguments.into_iter().map(Child::Node));
        Ok(SyntaxNode::new(kind, range, children).with_selector(selector))
    }

    /// Arguments of a call: `(a, b)` directly after the name, or command style
    ///
    /// Returns the arguments and, when any syntax was consumed, its end offset.
    fn parse_call_arguments(
        &mut self,
        command: bool,
    ) -> Result<(Vec<SyntaxNode>, Option<usize>)> {
        if self.cursor.peek() == Some('(') {
            self.cursor.bump();
            let arguments = self.parse_list(')')?;
            return Ok((arguments, Some(self.cursor.pos())));
        }
        if command && self.starts_command_argument() {
            let arguments = self.parse_command_arguments()?;
            let end = arguments.last().map(|arg| usize::from(arg.range().end()));
            return Ok((arguments, end));
        }
        Ok((Vec::new(), None))
    }

    fn starts_command_argument(&self) -> bool {
        let mut probe = self.cursor.clone();
        if !probe.skip_horizontal_trivia() {
            return false;
        }
        match probe.peek() {
            Some('"' | '\'' | '`' | '@' | '[' | '(') => true,
            Some(':') => matches!(
                probe.peek_nth(1),
                Some(ch) if is_ident_start(ch) || ch == '"' || ch == ':'
            ),
            Some('/') => !matches!(probe.peek_nth(1), None | Some(' ' | '=' | '\n')),
            Some('-') => matches!(probe.peek_nth(1), Some(ch) if ch.is_ascii_digit()),
            Some(ch) if ch.is_ascii_digit() => true,
            Some(ch) if is_ident_start(ch) => probe
                .peek_identifier()
                .is_some_and(|word| !KEYWORDS.contains(&word) || ARGUMENT_KEYWORDS.contains(&word)),
            _ => false,
        }
    }

    fn parse_command_arguments(&mut self) -> Result<Vec<SyntaxNode>> {
        let mut arguments = vec![self.parse_expression(false)?];
        loop {
            let checkpoint = self.cursor.clone();
            self.cursor.skip_horizontal_trivia();
            if !self.cursor.eat(",") {
                self.cursor = checkpoint;
                break;
            }
            self.cursor.skip_trivia();
            arguments.push(self.parse_expression(false)?);
        }
        Ok(arguments)
    }

    /// Comma-separated expressions up to and including `close`
    fn parse_list(&mut self, close: char) -> Result<Vec<SyntaxNode>> {
        let mut items = Vec::new();
        loop {
            self.cursor.skip_trivia();
            if self.eat_char(close) {
                break;
            }
            items.push(self.parse_expression(false)?);
            self.cursor.skip_trivia();
            if self.cursor.eat(",") {
                continue;
            }
            if self.eat_char(close) {
                break;
            }
            return Err(self.unexpected());
        }
        Ok(items)
    }

    // primaries

    fn parse_primary(&mut self, command: bool) -> Result<SyntaxNode> {
        self.cursor.skip_horizontal_trivia();
        let start = self.cursor.pos();
        let Some(ch) = self.cursor.peek() else {
            return Err(self.unexpected());
        };

        match ch {
            '"' => {
                self.cursor.bump();
                let parts = self.parse_literal_parts('"', true)?;
                Ok(quoted(NodeKind::Dstr, self.range_from(start), parts))
            }
            '\'' => {
                self.cursor.bump();
                let parts = self.parse_literal_parts('\'', false)?;
                Ok(quoted(NodeKind::Dstr, self.range_from(start), parts))
            }
            '`' => {
                self.cursor.bump();
                let parts = self.parse_literal_parts('`', true)?;
                let children = parts.into_iter().map(Child::Node).collect();
                Ok(SyntaxNode::new(NodeKind::Xstr, self.range_from(start), children))
            }
            '/' => self.parse_regexp(start),
            ':' if self.cursor.starts_with("::") => {
                self.cursor.eat("::");
                let cbase = SyntaxNode::new(NodeKind::Cbase, self.range_from(start), Vec::new());
                match self.cursor.eat_identifier() {
                    Some(name) if is_constant(name) => Ok(SyntaxNode::new(
                        NodeKind::Const,
                        self.range_from(start),
                        vec![cbase.into(), Child::Name(name.to_string())],
                    )),
                    _ => Err(self.unexpected()),
                }
            }
            ':' => self.parse_symbol(start),
            '@' => {
                self.cursor.bump();
                if self.cursor.eat_identifier().is_none() {
                    return Err(self.unexpected());
                }
                let name = &self.cursor.source()[start..self.cursor.pos()];
                Ok(SyntaxNode::new(
                    NodeKind::Ivar,
                    self.range_from(start),
                    vec![Child::Name(name.to_string())],
                ))
            }
            '[' => {
                self.cursor.bump();
                let items = self.parse_list(']')?;
                let children = items.into_iter().map(Child::Node).collect();
                Ok(SyntaxNode::new(NodeKind::Array, self.range_from(start), children))
            }
            '(' => {
                self.cursor.bump();
                let statements = self.parse_statements(Stop::Char(')'))?;
                self.cursor.skip_trivia();
                if !self.eat_char(')') {
                    return Err(self.expected("`)`"));
                }
                let children = statements.into_iter().map(Child::Node).collect();
                Ok(SyntaxNode::new(NodeKind::Begin, self.range_from(start), children))
            }
            '-' if matches!(self.cursor.peek_nth(1), Some(d) if d.is_ascii_digit()) => {
                self.cursor.bump();
                Ok(self.parse_number(start))
            }
            d if d.is_ascii_digit() => Ok(self.parse_number(start)),
            c if is_ident_start(c) => self.parse_identifier(start, command),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_number(&mut self, start: usize) -> SyntaxNode {
        self.cursor.eat_digits();
        let mut kind = NodeKind::Int;
        if self.cursor.peek() == Some('.')
            && matches!(self.cursor.peek_nth(1), Some(d) if d.is_ascii_digit())
        {
            self.cursor.bump();
            self.cursor.eat_digits();
            kind = NodeKind::Float;
        }
        let text = &self.cursor.source()[start..self.cursor.pos()];
        SyntaxNode::new(
            kind,
            self.range_from(start),
            vec![Child::Name(text.to_string())],
        )
    }

    fn parse_symbol(&mut self, start: usize) -> Result<SyntaxNode> {
        self.cursor.bump();
        if self.eat_char('"') {
            let parts = self.parse_literal_parts('"', true)?;
            return Ok(quoted(NodeKind::Dsym, self.range_from(start), parts));
        }
        let Some(name) = self.cursor.eat_identifier() else {
            return Err(self.unexpected());
        };
        Ok(SyntaxNode::new(
            NodeKind::Sym,
            self.range_from(start),
            vec![Child::Name(name.to_string())],
        ))
    }

    fn parse_regexp(&mut self, start: usize) -> Result<SyntaxNode> {
        self.cursor.bump();
        let parts = self.parse_literal_parts('/', true)?;

        let options_start = self.cursor.pos();
        let mut options = Vec::new();
        while let Some(flag) = self.cursor.peek().filter(|ch| "imxounse".contains(*ch)) {
            self.cursor.bump();
            options.push(Child::Name(flag.to_string()));
        }
        let regopt = SyntaxNode::new(NodeKind::Regopt, self.range_from(options_start), options);

        let mut children: Vec<Child> = parts.into_iter().map(Child::Node).collect();
        children.push(regopt.into());
        Ok(SyntaxNode::new(NodeKind::Regexp, self.range_from(start), children))
    }

    /// Literal body after the opening delimiter, consuming the closing one
    ///
    /// Escapes are kept verbatim in `str` values.
    fn parse_literal_parts(&mut self, close: char, interpolate: bool) -> Result<Vec<SyntaxNode>> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut literal_start = self.cursor.pos();

        loop {
            let Some(ch) = self.cursor.peek() else {
                return Err(RubricError::parse_error(
                    "unterminated literal",
                    self.cursor.source(),
                    literal_start,
                ));
            };

            if ch == close {
                flush_literal(&mut parts, &mut literal, literal_start, self.cursor.pos());
                self.cursor.bump();
                break;
            }

            if ch == '\\' {
                literal.push(ch);
                self.cursor.bump();
                if let Some(escaped) = self.cursor.bump() {
                    literal.push(escaped);
                }
                continue;
            }

            if interpolate && self.cursor.starts_with("#{") {
                flush_literal(&mut parts, &mut literal, literal_start, self.cursor.pos());
                parts.push(self.parse_interpolation()?);
                literal_start = self.cursor.pos();
                continue;
            }

            literal.push(ch);
            self.cursor.bump();
        }

        Ok(parts)
    }

    fn parse_interpolation(&mut self) -> Result<SyntaxNode> {
        let start = self.cursor.pos();
        self.cursor.eat("#{");
        let statements = self.parse_statements(Stop::Char('}'))?;
        self.cursor.skip_trivia();
        if !self.eat_char('}') {
            return Err(RubricError::parse_error(
                "unterminated interpolation",
                self.cursor.source(),
                start,
            ));
        }
        let children = statements.into_iter().map(Child::Node).collect();
        Ok(SyntaxNode::new(
            NodeKind::Interpolation,
            self.range_from(start),
            children,
        ))
    }

    fn parse_identifier(&mut self, start: usize, command: bool) -> Result<SyntaxNode> {
        let Some(word) = self.cursor.peek_identifier() else {
            return Err(self.unexpected());
        };

        match word {
            "begin" => return self.parse_kwbegin(start),
            "if" => return self.parse_if(start, false),
            "unless" => return self.parse_if(start, true),
            "def" => return self.parse_def(start),
            "not" => {
                self.cursor.eat_keyword("not");
                let selector = self.range_from(start);
                let operand = self.parse_expression(false)?;
                let range = TextRange::new(selector.start(), operand.range().end());
                return Ok(SyntaxNode::new(
                    NodeKind::Send,
                    range,
                    vec![operand.into(), Child::Name("!".to_string())],
                )
                .with_selector(selector));
            }
            "return" => {
                self.cursor.eat_keyword("return");
                let arguments = if self.starts_command_argument() {
                    self.parse_command_arguments()?
                } else {
                    Vec::new()
                };
                let children = arguments.into_iter().map(Child::Node).collect();
                return Ok(SyntaxNode::new(
                    NodeKind::Return,
                    self.range_from(start),
                    children,
                ));
            }
            _ => {}
        }

        let leaf = match word {
            "nil" => Some(NodeKind::Nil),
            "self" => Some(NodeKind::SelfRef),
            "true" => Some(NodeKind::True),
            "false" => Some(NodeKind::False),
            _ => None,
        };
        if let Some(kind) = leaf {
            self.cursor.eat_identifier();
            return Ok(SyntaxNode::new(kind, self.range_from(start), Vec::new()));
        }

        if KEYWORDS.contains(&word) {
            return Err(self.unexpected());
        }

        self.cursor.eat_identifier();
        let selector = self.range_from(start);

        if is_constant(word) && self.cursor.peek() != Some('(') {
            return Ok(SyntaxNode::new(
                NodeKind::Const,
                selector,
                vec![Child::Absent, Child::Name(word.to_string())],
            ));
        }

        if self.is_local(word) && self.cursor.peek() != Some('(') {
            return Ok(SyntaxNode::new(
                NodeKind::Lvar,
                selector,
                vec![Child::Name(word.to_string())],
            ));
        }

        let (arguments, arguments_end) = self.parse_call_arguments(command)?;
        let end = arguments_end.map_or(selector.end(), text_size);
        let mut children = vec![Child::Absent, Child::Name(word.to_string())];
        children.extend(arguments.into_iter().map(Child::Node));
        Ok(
            SyntaxNode::new(NodeKind::Send, TextRange::new(selector.start(), end), children)
                .with_selector(selector),
        )
    }

    fn parse_kwbegin(&mut self, start: usize) -> Result<SyntaxNode> {
        self.cursor.eat_keyword("begin");
        let body = self.parse_body()?;
        self.expect_keyword("end")?;
        Ok(SyntaxNode::new(
            NodeKind::Kwbegin,
            self.range_from(start),
            vec![body.into()],
        ))
    }

    /// Statements with optional rescue clauses, `else` and `ensure`
    fn parse_body(&mut self) -> Result<Option<SyntaxNode>> {
        let mut body = sequence(self.parse_statements(Stop::Keywords(BODY_END))?);

        let mut clauses = Vec::new();
        while self.cursor.peek_keyword() == Some("rescue") {
            clauses.push(self.parse_resbody()?);
        }

        if let (Some(first), Some(last)) = (clauses.first(), clauses.last()) {
            let else_body = if self.cursor.eat_keyword("else") {
                sequence(self.parse_statements(Stop::Keywords(&["ensure", "end"]))?)
            } else {
                None
            };
            let start = body.as_ref().unwrap_or(first).range().start();
            let end = else_body.as_ref().unwrap_or(last).range().end();

            let mut children = vec![Child::from(body)];
            children.extend(clauses.into_iter().map(Child::Node));
            children.push(else_body.into());
            body = Some(SyntaxNode::new(
                NodeKind::Rescue,
                TextRange::new(start, end),
                children,
            ));
        } else if self.cursor.peek_keyword() == Some("else") {
            return Err(self.unexpected());
        }

        if self.cursor.peek_keyword() == Some("ensure") {
            let keyword_start = self.cursor.pos();
            self.cursor.eat_keyword("ensure");
            let keyword = self.range_from(keyword_start);
            let ensure_body = sequence(self.parse_statements(Stop::Keywords(&["end"]))?);

            let start = body.as_ref().map_or(keyword.start(), |b| b.range().start());
            let end = ensure_body.as_ref().map_or(keyword.end(), |b| b.range().end());
            body = Some(SyntaxNode::new(
                NodeKind::Ensure,
                TextRange::new(start, end),
                vec![body.into(), ensure_body.into()],
            ));
        }

        Ok(body)
    }

    fn parse_resbody(&mut self) -> Result<SyntaxNode> {
        let start = self.cursor.pos();
        self.cursor.eat_keyword("rescue");
        let keyword = self.range_from(start);
        self.cursor.skip_horizontal_trivia();

        let mut classes = Vec::new();
        if !self.at_clause_header_end() {
            loop {
                classes.push(self.parse_expression(false)?);
                let checkpoint = self.cursor.clone();
                self.cursor.skip_horizontal_trivia();
                if self.cursor.eat(",") {
                    self.cursor.skip_trivia();
                    continue;
                }
                self.cursor = checkpoint;
                break;
            }
        }
        let exceptions = match (classes.first(), classes.last()) {
            (Some(first), Some(last)) => {
                let range = cover(first, last);
                Some(SyntaxNode::new(
                    NodeKind::Array,
                    range,
                    classes.into_iter().map(Child::Node).collect(),
                ))
            }
            _ => None,
        };

        self.cursor.skip_horizontal_trivia();
        let variable = if self.cursor.eat("=>") {
            self.cursor.skip_horizontal_trivia();
            let variable_start = self.cursor.pos();
            match self.cursor.eat_identifier() {
                Some(name) if !is_constant(name) && !KEYWORDS.contains(&name) => {
                    self.declare(name);
                    Some(SyntaxNode::new(
                        NodeKind::Lvasgn,
                        self.range_from(variable_start),
                        vec![Child::Name(name.to_string())],
                    ))
                }
                _ => return Err(self.expected("exception variable name")),
            }
        } else {
            None
        };

        self.cursor.skip_horizontal_trivia();
        self.cursor.eat_keyword("then");
        let body = sequence(self.parse_statements(Stop::Keywords(BODY_END))?);

        let end = body
            .as_ref()
            .or(variable.as_ref())
            .or(exceptions.as_ref())
            .map_or(keyword.end(), |node| node.range().end());
        Ok(SyntaxNode::new(
            NodeKind::Resbody,
            TextRange::new(keyword.start(), end),
            vec![exceptions.into(), variable.into(), body.into()],
        ))
    }

    fn at_clause_header_end(&self) -> bool {
        matches!(self.cursor.peek(), None | Some('\n' | ';'))
            || self.cursor.starts_with("=>")
            || self.cursor.peek_keyword() == Some("then")
    }

    fn parse_if(&mut self, start: usize, negate: bool) -> Result<SyntaxNode> {
        self.cursor.eat_identifier();
        let (condition, then_branch, else_branch) = self.parse_conditional(negate)?;
        self.expect_keyword("end")?;
        Ok(SyntaxNode::new(
            NodeKind::If,
            self.range_from(start),
            vec![condition.into(), then_branch.into(), else_branch.into()],
        ))
    }

    /// Condition and branches after `if`/`unless`/`elsif`, up to `end`
    fn parse_conditional(
        &mut self,
        negate: bool,
    ) -> Result<(SyntaxNode, Option<SyntaxNode>, Option<SyntaxNode>)> {
        let condition = self.parse_expression(false)?;
        self.cursor.skip_horizontal_trivia();
        self.cursor.eat_keyword("then");
        let body = sequence(self.parse_statements(Stop::Keywords(&["elsif", "else", "end"]))?);

        let alternative = if !negate && self.cursor.peek_keyword() == Some("elsif") {
            let elsif_start = self.cursor.pos();
            self.cursor.eat_keyword("elsif");
            let (nested_condition, nested_then, nested_else) = self.parse_conditional(false)?;
            let end = nested_else
                .as_ref()
                .or(nested_then.as_ref())
                .unwrap_or(&nested_condition)
                .range()
                .end();
            Some(SyntaxNode::new(
                NodeKind::If,
                TextRange::new(text_size(elsif_start), end),
                vec![
                    nested_condition.into(),
                    nested_then.into(),
                    nested_else.into(),
                ],
            ))
        } else if self.cursor.eat_keyword("else") {
            sequence(self.parse_statements(Stop::Keywords(&["end"]))?)
        } else {
            None
        };

        if negate {
            Ok((condition, alternative, body))
        } else {
            Ok((condition, body, alternative))
        }
    }

    fn parse_def(&mut self, start: usize) -> Result<SyntaxNode> {
        self.cursor.eat_keyword("def");
        self.cursor.skip_horizontal_trivia();

        let selector_start = self.cursor.pos();
        if self.cursor.eat_keyword("self") && !self.cursor.eat(".") {
            return Err(self.expected("`.` after `self`"));
        }
        let name_start = self.cursor.pos();
        if self.cursor.eat_identifier().is_none() {
            return Err(self.expected("method name"));
        }
        let name = &self.cursor.source()[selector_start..self.cursor.pos()];
        let selector = text_range(name_start, self.cursor.pos());

        self.scopes.push(HashSet::new());
        let arguments = self.parse_parameters()?;
        let body = self.parse_body()?;
        self.expect_keyword("end")?;
        self.scopes.pop();

        Ok(SyntaxNode::new(
            NodeKind::Def,
            self.range_from(start),
            vec![Child::Name(name.to_string()), arguments.into(), body.into()],
        )
        .with_selector(selector))
    }

    fn parse_parameters(&mut self) -> Result<SyntaxNode> {
        let parenthesized = self.eat_char('(');
        if !parenthesized {
            self.cursor.skip_horizontal_trivia();
        }
        let start = self.cursor.pos();
        let mut parameters = Vec::new();
        loop {
            if parenthesized {
                self.cursor.skip_trivia();
                if self.eat_char(')') {
                    break;
                }
            } else if matches!(self.cursor.peek(), None | Some('\n' | ';')) {
                break;
            }

            let parameter_start = self.cursor.pos();
            let Some(name) = self.cursor.eat_identifier() else {
                return Err(self.expected("parameter name"));
            };
            self.declare(name);
            parameters.push(Child::Node(SyntaxNode::new(
                NodeKind::Arg,
                self.range_from(parameter_start),
                vec![Child::Name(name.to_string())],
            )));

            self.cursor.skip_horizontal_trivia();
            if self.cursor.eat(",") {
                continue;
            }
            if parenthesized {
                self.cursor.skip_trivia();
                if self.eat_char(')') {
                    break;
                }
                return Err(self.expected("`)`"));
            }
            break;
        }
        Ok(SyntaxNode::new(NodeKind::Args, self.range_from(start), parameters))
    }

    // helpers

    fn declare(&mut self, name: &'s str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name);
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains(name))
    }

    fn eat_char(&mut self, ch: char) -> bool {
        if self.cursor.peek() == Some(ch) {
            self.cursor.bump();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        self.skip_separators();
        if self.cursor.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.expected(&format!("`{keyword}`")))
        }
    }

    fn range_from(&self, start: usize) -> TextRange {
        text_range(start, self.cursor.pos())
    }

    fn unexpected(&self) -> RubricError {
        let message = match (self.cursor.peek_keyword(), self.cursor.peek()) {
            (Some(keyword), _) => format!("unexpected keyword `{keyword}`"),
            (None, Some(ch)) => format!("unexpected character `{ch}`"),
            (None, None) => "unexpected end of input".to_string(),
        };
        RubricError::parse_error(message, self.cursor.source(), self.cursor.pos())
    }

    fn expected(&self, what: &str) -> RubricError {
        let found = match self.cursor.peek() {
            Some(ch) => format!("`{ch}`"),
            None => "end of input".to_string(),
        };
        RubricError::parse_error(
            format!("expected {what}, found {found}"),
            self.cursor.source(),
            self.cursor.pos(),
        )
    }
}

/// Fold a statement list: nothing, the single statement, or a `begin` sequence
fn sequence(mut statements: Vec<SyntaxNode>) -> Option<SyntaxNode> {
    if statements.len() <= 1 {
        return statements.pop();
    }
    let range = match (statements.first(), statements.last()) {
        (Some(first), Some(last)) => cover(first, last),
        _ => return None,
    };
    Some(SyntaxNode::new(
        NodeKind::Begin,
        range,
        statements.into_iter().map(Child::Node).collect(),
    ))
}

/// String or symbol literal: plain when it has no interpolation
fn quoted(kind: NodeKind, range: TextRange, mut parts: Vec<SyntaxNode>) -> SyntaxNode {
    let plain = match kind {
        NodeKind::Dsym => NodeKind::Sym,
        _ => NodeKind::Str,
    };
    let interpolated = parts.iter().any(|part| part.is(NodeKind::Interpolation));
    if interpolated {
        return SyntaxNode::new(kind, range, parts.into_iter().map(Child::Node).collect());
    }
    let value = parts
        .pop()
        .and_then(|part| part.name_at(0).map(str::to_string))
        .unwrap_or_default();
    SyntaxNode::new(plain, range, vec![Child::Name(value)])
}

fn flush_literal(parts: &mut Vec<SyntaxNode>, literal: &mut String, start: usize, end: usize) {
    if literal.is_empty() {
        return;
    }
    parts.push(SyntaxNode::new(
        NodeKind::Str,
        text_range(start, end),
        vec![Child::Name(std::mem::take(literal))],
    ));
}

fn cover(first: &SyntaxNode, last: &SyntaxNode) -> TextRange {
    TextRange::new(first.range().start(), last.range().end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn sexp(source: &str) -> String {
        parse_ruby(source)
            .expect("source should parse")
            .map(|node| node.to_sexp())
            .unwrap_or_default()
    }

    #[test]
    fn test_empty_program() {
        assert!(parse_ruby("").unwrap().is_none());
        assert!(parse_ruby("  # only a comment\n").unwrap().is_none());
    }

    #[test]
    fn test_method_call_chain() {
        insta::assert_snapshot!(sexp("result.to_s"), @"(send (send nil :result) :to_s)");
        insta::assert_snapshot!(sexp("result.to_s(8)"), @"(send (send nil :result) :to_s (int 8))");
    }

    #[test]
    fn test_safe_navigation_call() {
        insta::assert_snapshot!(sexp("user&.name"), @"(csend (send nil :user) :name)");
        insta::assert_snapshot!(sexp("a&.b.c"), @"(send (csend (send nil :a) :b) :c)");
    }

    #[test]
    fn test_local_variables_shadow_calls() {
        insta::assert_snapshot!(
            sexp("x = 1; x.to_s"),
            @"(begin (lvasgn :x (int 1)) (send (lvar :x) :to_s))"
        );
    }

    #[test]
    fn test_interpolated_string() {
        insta::assert_snapshot!(
            sexp(r#""a #{x} b""#),
            @r#"(dstr (str "a ") (interpolation (send nil :x)) (str " b"))"#
        );
        insta::assert_snapshot!(sexp(r#""plain""#), @r#"(str "plain")"#);
        insta::assert_snapshot!(sexp(r##""#{}""##), @"(dstr (interpolation))");
    }

    #[test]
    fn test_interpolation_with_several_statements() {
        insta::assert_snapshot!(
            sexp(r##""#{top; result.to_s}""##),
            @"(dstr (interpolation (send nil :top) (send (send nil :result) :to_s)))"
        );
    }

    #[test]
    fn test_other_interpolating_literals() {
        insta::assert_snapshot!(
            sexp("/re #{x}/i"),
            @r#"(regexp (str "re ") (interpolation (send nil :x)) (regopt :i))"#
        );
        insta::assert_snapshot!(sexp(r#":"sym#{x}""#), @r#"(dsym (str "sym") (interpolation (send nil :x)))"#);
        insta::assert_snapshot!(sexp("`ls #{dir}`"), @r#"(xstr (str "ls ") (interpolation (send nil :dir)))"#);
        insta::assert_snapshot!(sexp(":name"), @"(sym :name)");
    }

    #[test]
    fn test_rescue_clause() {
        insta::assert_snapshot!(
            sexp("begin\n  foo\nrescue Exception => e\n  raise e\nend"),
            @"(kwbegin (rescue (send nil :foo) (resbody (array (const nil :Exception)) (lvasgn :e) (send nil :raise (lvar :e))) nil))"
        );
    }

    #[test]
    fn test_rescue_clause_variants() {
        insta::assert_snapshot!(
            sexp("begin; rescue; end"),
            @"(kwbegin (rescue nil (resbody nil nil nil) nil))"
        );
        insta::assert_snapshot!(
            sexp("begin\nrescue ::Exception, Foo::Bar\n  Kernel.raise\nensure\n  done\nend"),
            @"(kwbegin (ensure (rescue nil (resbody (array (const (cbase) :Exception) (const (const nil :Foo) :Bar)) nil (send (const nil :Kernel) :raise)) nil) (send nil :done)))"
        );
    }

    #[test]
    fn test_def_with_rescue() {
        insta::assert_snapshot!(
            sexp("def run(x)\n  x.call\nrescue => e\n  log e\nend"),
            @"(def :run (args (arg :x)) (rescue (send (lvar :x) :call) (resbody nil (lvasgn :e) (send nil :log (lvar :e))) nil))"
        );
    }

    #[test]
    fn test_command_call_and_modifier() {
        insta::assert_snapshot!(
            sexp("raise ArgumentError, \"bad\" if x == 1"),
            @r#"(if (send (send nil :x) :== (int 1)) (send nil :raise (const nil :ArgumentError) (str "bad")) nil)"#
        );
    }

    #[test]
    fn test_if_elsif_else() {
        insta::assert_snapshot!(
            sexp("if a\n  b\nelsif c\n  d\nelse\n  e\nend"),
            @"(if (send nil :a) (send nil :b) (if (send nil :c) (send nil :d) (send nil :e)))"
        );
    }

    #[test]
    fn test_ranges() {
        let source = "\"a #{x.to_s}\"";
        let root = parse_ruby(source).unwrap().unwrap();
        let interpolation = root.child_node(1).unwrap();
        assert_eq!(interpolation.text(source), "#{x.to_s}");

        let call = interpolation.child_node(0).unwrap();
        assert_eq!(call.text(source), "x.to_s");
        let selector = call.selector().unwrap();
        assert_eq!(usize::from(selector.start()), 7);
        assert_eq!(usize::from(selector.end()), 11);
    }

    #[test]
    fn test_resbody_range_covers_clause() {
        let source = "begin\nrescue Exception\n  handle\nend";
        let root = parse_ruby(source).unwrap().unwrap();
        let rescue = root.body().unwrap();
        let resbody = rescue.child_node(1).unwrap();
        assert_eq!(resbody.text(source), "rescue Exception\n  handle");
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_ruby("begin\n  foo\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("expected `end`"));

        let err = parse_ruby("\"open #{x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        assert!(parse_ruby("end").is_err());
        assert!(parse_ruby("foo bar baz").is_err());
    }
}
