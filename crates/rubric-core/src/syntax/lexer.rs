//! Character cursor used by the parser
//!
//! Ruby's lexical grammar depends on parser state (a `/` may start a regexp
//! or be a division, `#{` only opens an interpolation inside a literal), so the
//! parser drives this cursor directly instead of consuming a token stream.

/// Keywords that can never be used as a plain method call
pub const KEYWORDS: &[&str] = &[
    "and", "begin", "def", "do", "else", "elsif", "end", "ensure", "false", "if", "nil", "not",
    "or", "rescue", "return", "self", "then", "true", "unless",
];

/// Position-tracking cursor over the source text
#[derive(Debug, Clone)]
pub struct Cursor<'s> {
    source: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source, pos: 0 }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Character `n` chars ahead of the current one
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Character just before the cursor
    pub fn prev(&self) -> Option<char> {
        self.source[..self.pos].chars().next_back()
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    pub fn starts_with(&self, text: &str) -> bool {
        self.rest().starts_with(text)
    }

    /// Consume `text` if the input continues with it
    pub fn eat(&mut self, text: &str) -> bool {
        if self.starts_with(text) {
            self.pos += text.len();
            true
        } else {
            false
        }
    }

    /// Skip spaces, tabs, line continuations and comments; stops at newlines
    ///
    /// Returns true if anything was skipped.
    pub fn skip_horizontal_trivia(&mut self) -> bool {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('\\') if matches!(self.peek_nth(1), Some('\n')) => {
                    self.pos += 2;
                }
                Some('#') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
        self.pos > start
    }

    /// Skip all trivia including newlines and `=begin`/`=end` blocks
    pub fn skip_trivia(&mut self) {
        loop {
            self.skip_horizontal_trivia();
            if self.peek() == Some('\n') {
                self.bump();
                if self.starts_with("=begin") {
                    self.skip_embedded_document();
                }
                continue;
            }
            if self.pos == 0 && self.starts_with("=begin") {
                self.skip_embedded_document();
                continue;
            }
            break;
        }
    }

    fn skip_embedded_document(&mut self) {
        match self.rest().find("\n=end") {
            Some(idx) => {
                self.pos += idx + "\n=end".len();
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.bump();
                }
            }
            None => self.pos = self.source.len(),
        }
    }

    /// Identifier at the cursor without consuming it
    ///
    /// Includes a trailing `?` or `!` when it cannot be the start of `!=`.
    pub fn peek_identifier(&self) -> Option<&'s str> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        let (_, first) = chars.next()?;
        if !is_ident_start(first) {
            return None;
        }
        let mut end = first.len_utf8();
        for (idx, ch) in chars {
            if is_ident_continue(ch) {
                end = idx + ch.len_utf8();
            } else {
                break;
            }
        }
        let tail = &rest[end..];
        if (tail.starts_with('?') || tail.starts_with('!'))
            && !tail[1..].starts_with('=')
        {
            end += 1;
        }
        Some(&rest[..end])
    }

    /// Keyword at the cursor, if the identifier there is one
    pub fn peek_keyword(&self) -> Option<&'s str> {
        self.peek_identifier()
            .filter(|word| KEYWORDS.contains(word))
    }

    pub fn eat_identifier(&mut self) -> Option<&'s str> {
        let ident = self.peek_identifier()?;
        self.pos += ident.len();
        Some(ident)
    }

    /// Consume `keyword` if the next identifier is exactly it
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_identifier() == Some(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    /// Consume a run of ASCII digits and underscores
    pub fn eat_digits(&mut self) -> &'s str {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit() || ch == '_') {
            self.bump();
        }
        &self.source[start..self.pos]
    }
}

pub fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

pub fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Constants start with an uppercase letter
pub fn is_constant(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
