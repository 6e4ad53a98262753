// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Lexer for the restricted SPARC assembly dialect.
//!
//! The whole source is lexed up front into a `Vec<Token>`; [`TokenStream`]
//! is a cursor over that vector, so `peek` is idempotent and
//! snapshot/restore is a plain index copy. The stream always ends in a
//! single `Eof` token which `peek` keeps returning once reached.

use std::iter::Peekable;
use std::str::Chars;

use crate::core::error::{ErrorKind, SourceError};

/// Location of a lexeme: 1-based line, 0-based column of its first
/// character, and the lexeme length in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub col: usize,
    pub len: usize,
}

impl Span {
    pub fn new(line: u32, col: usize, len: usize) -> Self {
        Self { line, col, len }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    Percent,
    Colon,
    Dot,
    Comma,
    Assign,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Plus,
    Minus,
    Ampersand,
    Pipe,
    Caret,
    Str,
    Char,
    Number,
    Ident,
    Eof,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Comment => "comment",
            TokenKind::Percent => "`%`",
            TokenKind::Colon => "`:`",
            TokenKind::Dot => "`.`",
            TokenKind::Comma => "`,`",
            TokenKind::Assign => "`=`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Ampersand => "`&`",
            TokenKind::Pipe => "`|`",
            TokenKind::Caret => "`^`",
            TokenKind::Str => "string literal",
            TokenKind::Char => "character literal",
            TokenKind::Number => "number",
            TokenKind::Ident => "identifier",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A located token. `text` is the verbatim lexeme (including quotes and
/// comment delimiters), so `span` always points at its first character.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: Option<i64>,
    pub span: Span,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            value: None,
            span,
        }
    }
}

struct Tokenizer<'a> {
    iter: Peekable<Chars<'a>>,
    line: u32,
    col: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            iter: source.chars().peekable(),
            line: 1,
            col: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.iter.peek().copied()
    }

    fn consume(&mut self) -> Option<char> {
        let ch = self.iter.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn error(&self, msg: impl Into<String>, span: Span) -> SourceError {
        SourceError::new(ErrorKind::Lex, msg).with_span(span)
    }

    fn run(mut self) -> Result<Vec<Token>, SourceError> {
        let mut tokens = Vec::new();
        loop {
            while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
                self.consume();
            }
            let start = Span::new(self.line, self.col, 1);
            let Some(ch) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", start));
                return Ok(tokens);
            };

            if ch == '!' {
                tokens.push(self.line_comment(start));
                continue;
            }
            if ch == '/' {
                tokens.push(self.block_comment(start)?);
                continue;
            }
            if ch == '"' {
                tokens.push(self.string_literal(start)?);
                continue;
            }
            if ch == '\'' {
                tokens.push(self.char_literal(start)?);
                continue;
            }
            if ch.is_ascii_digit() {
                tokens.push(self.number(start)?);
                continue;
            }
            if ch.is_ascii_alphabetic() || ch == '_' || ch == '.' {
                if let Some(tok) = self.ident(start) {
                    tokens.push(tok);
                    continue;
                }
                // A dot not starting an identifier falls through to the
                // single-character tokens below.
            }

            if let Some(kind) = single_char_token(ch) {
                self.consume();
                tokens.push(Token::new(kind, ch.to_string(), start));
                continue;
            }

            return Err(self.error(format!("unexpected character `{ch}`"), start));
        }
    }

    fn line_comment(&mut self, start: Span) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                self.consume();
                break;
            }
            text.push(ch);
            self.consume();
        }
        let span = Span { len: text.chars().count(), ..start };
        Token::new(TokenKind::Comment, text, span)
    }

    fn block_comment(&mut self, start: Span) -> Result<Token, SourceError> {
        let mut text = String::new();
        text.push(self.consume().unwrap_or('/'));
        match self.peek() {
            Some('*') => text.push(self.consume().unwrap_or('*')),
            _ => return Err(self.error("unexpected character `/`", start)),
        }
        let mut prev = '\0';
        loop {
            let Some(ch) = self.consume() else {
                return Err(self.error("unterminated block comment", start));
            };
            text.push(ch);
            if prev == '*' && ch == '/' {
                break;
            }
            prev = ch;
        }
        let span = Span { len: text.chars().count(), ..start };
        Ok(Token::new(TokenKind::Comment, text, span))
    }

    fn string_literal(&mut self, start: Span) -> Result<Token, SourceError> {
        let mut text = String::new();
        text.push(self.consume().unwrap_or('"'));
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(self.error("unterminated string literal", start));
                }
                Some('"') => {
                    text.push(self.consume().unwrap_or('"'));
                    break;
                }
                Some(ch) => {
                    text.push(ch);
                    self.consume();
                }
            }
        }
        let span = Span { len: text.chars().count(), ..start };
        Ok(Token::new(TokenKind::Str, text, span))
    }

    fn char_literal(&mut self, start: Span) -> Result<Token, SourceError> {
        let mut text = String::new();
        text.push(self.consume().unwrap_or('\''));
        let ch = match self.peek() {
            None | Some('\n') => {
                return Err(self.error("unterminated character literal", start));
            }
            Some('\\') => {
                return Err(self.error("escape sequences are not supported", start));
            }
            Some(ch) => ch,
        };
        text.push(ch);
        self.consume();
        match self.peek() {
            Some('\'') => {
                text.push(self.consume().unwrap_or('\''));
            }
            _ => return Err(self.error("unterminated character literal", start)),
        }
        Ok(Token::new(TokenKind::Char, text, Span { len: 3, ..start }))
    }

    fn number(&mut self, start: Span) -> Result<Token, SourceError> {
        let mut text = String::new();
        let first = self.consume().unwrap_or('0');
        text.push(first);
        if first == '0' && self.peek() == Some('x') {
            text.push(self.consume().unwrap_or('x'));
            // Hex digits are uppercase only.
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() || ('A'..='F').contains(&ch) {
                    text.push(ch);
                    self.consume();
                } else {
                    break;
                }
            }
            if text.len() == 2 {
                return Err(self.error("malformed hex literal", start));
            }
            let value = i64::from_str_radix(&text[2..], 16)
                .map_err(|_| self.error(format!("number out of range: {text}"), start))?;
            let span = Span { len: text.len(), ..start };
            let mut tok = Token::new(TokenKind::Number, text, span);
            tok.value = Some(value);
            return Ok(tok);
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.consume();
            } else {
                break;
            }
        }
        let value = text
            .parse::<i64>()
            .map_err(|_| self.error(format!("number out of range: {text}"), start))?;
        let span = Span { len: text.len(), ..start };
        let mut tok = Token::new(TokenKind::Number, text, span);
        tok.value = Some(value);
        Ok(tok)
    }

    /// Identifier: `[.]?[A-Za-z_][A-Za-z0-9_]*`. Returns `None` when a
    /// leading dot is not followed by a letter or underscore; the caller
    /// then lexes the dot as its own token.
    fn ident(&mut self, start: Span) -> Option<Token> {
        let first = self.peek()?;
        if first == '.' {
            let mut ahead = self.iter.clone();
            ahead.next();
            match ahead.peek() {
                Some(ch) if ch.is_ascii_alphabetic() || *ch == '_' => {}
                _ => return None,
            }
        }
        let mut text = String::new();
        text.push(first);
        self.consume();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.consume();
            } else {
                break;
            }
        }
        let span = Span { len: text.chars().count(), ..start };
        Some(Token::new(TokenKind::Ident, text, span))
    }
}

fn single_char_token(ch: char) -> Option<TokenKind> {
    match ch {
        '%' => Some(TokenKind::Percent),
        ':' => Some(TokenKind::Colon),
        '.' => Some(TokenKind::Dot),
        ',' => Some(TokenKind::Comma),
        '=' => Some(TokenKind::Assign),
        '[' => Some(TokenKind::LBracket),
        ']' => Some(TokenKind::RBracket),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '+' => Some(TokenKind::Plus),
        '-' => Some(TokenKind::Minus),
        '&' => Some(TokenKind::Ampersand),
        '|' => Some(TokenKind::Pipe),
        '^' => Some(TokenKind::Caret),
        _ => None,
    }
}

/// Cursor over the lexed token vector.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

/// Opaque snapshot of a [`TokenStream`] position.
#[derive(Debug, Clone, Copy)]
pub struct Mark(usize);

impl TokenStream {
    pub fn lex(source: &str) -> Result<Self, SourceError> {
        let tokens = Tokenizer::new(source).run()?;
        Ok(Self { tokens, pos: 0 })
    }

    pub fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    pub fn snapshot(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn restore(&mut self, mark: Mark) {
        self.pos = mark.0;
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenKind, TokenStream};

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut ts = TokenStream::lex(source).expect("lex");
        let mut out = Vec::new();
        loop {
            let tok = ts.advance();
            let kind = tok.kind;
            out.push(kind);
            if kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn stream_terminates_with_single_eof_and_peek_is_stable() {
        let mut ts = TokenStream::lex("mov 2, %l3").expect("lex");
        while ts.peek().kind != TokenKind::Eof {
            ts.advance();
        }
        assert_eq!(ts.peek().kind, TokenKind::Eof);
        ts.advance();
        ts.advance();
        assert_eq!(ts.peek().kind, TokenKind::Eof);
    }

    #[test]
    fn snapshot_restore_rewinds_the_stream() {
        let mut ts = TokenStream::lex("cmp %l0, %l1").expect("lex");
        let before = ts.peek().text.clone();
        let mark = ts.snapshot();
        ts.advance();
        ts.advance();
        ts.restore(mark);
        assert_eq!(ts.peek().text, before);
    }

    #[test]
    fn token_spans_point_at_the_lexeme_start() {
        let source = "set 0xFFFF, %l1";
        let mut ts = TokenStream::lex(source).expect("lex");
        loop {
            let tok = ts.advance();
            if tok.kind == TokenKind::Eof {
                break;
            }
            let found = source
                .lines()
                .nth(tok.span.line as usize - 1)
                .and_then(|line| line.get(tok.span.col..))
                .map(|rest| rest.starts_with(&tok.text));
            assert_eq!(found, Some(true), "span of {:?}", tok.text);
        }
    }

    #[test]
    fn hex_literals_require_uppercase_digits() {
        let mut ts = TokenStream::lex("0xFF").expect("lex");
        assert_eq!(ts.advance().value, Some(255));
        assert!(TokenStream::lex("0xff").is_err());
        assert!(TokenStream::lex("0x").is_err());
    }

    #[test]
    fn comments_preserve_their_text() {
        let mut ts = TokenStream::lex("! trailing words\nnop").expect("lex");
        let tok = ts.advance();
        assert_eq!(tok.kind, TokenKind::Comment);
        assert_eq!(tok.text, "! trailing words");
        assert_eq!(ts.advance().text, "nop");

        let mut ts = TokenStream::lex("/* boxed\ncomment */ nop").expect("lex");
        let tok = ts.advance();
        assert_eq!(tok.kind, TokenKind::Comment);
        assert_eq!(tok.text, "/* boxed\ncomment */");
    }

    #[test]
    fn dotted_identifiers_and_bare_dots_are_distinct() {
        assert_eq!(
            kinds(".global main"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
        // A dot not followed by a letter lexes alone.
        assert_eq!(
            kinds(". 5"),
            vec![TokenKind::Dot, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(TokenStream::lex("\"no end").is_err());
        assert!(TokenStream::lex("\"split\nhere\"").is_err());
    }

    #[test]
    fn punctuation_lexes_to_one_token_each() {
        assert_eq!(
            kinds("% : , = [ ] ( ) + - & | ^"),
            vec![
                TokenKind::Percent,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Assign,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Ampersand,
                TokenKind::Pipe,
                TokenKind::Caret,
                TokenKind::Eof,
            ]
        );
    }
}
