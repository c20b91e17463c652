//! Tokenizer for PL/0 source text.
//!
//! The lexer is pulled one token at a time by the parser. Whitespace
//! separates tokens and is otherwise ignored; there are no comments.

use pl0_common::Value;

use crate::error::{CompileError, LexicalError};
use crate::token::{Literal, Position, Token, TokenKind};

/// Produces tokens from a source string on demand.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    rest: &'a str,
    position: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            rest: source,
            position: Position::default(),
        }
    }

    /// Position of the next unread character. Once the input is
    /// exhausted this is just past the last character.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, CompileError> {
        self.take_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
        let position = self.position;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = if c.is_ascii_alphabetic() || c == '_' {
            self.word(position)
        } else if c.is_ascii_digit() {
            self.number(position)?
        } else {
            self.punctuator(c, position)?
        };
        Ok(Some(token))
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest.chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        if c == '\n' {
            self.position.row += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.rest;
        let mut len = 0;
        while let Some(c) = self.peek().filter(|&c| pred(c)) {
            len += c.len_utf8();
            self.bump();
        }
        &start[..len]
    }

    fn word(&mut self, position: Position) -> Token {
        let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        match TokenKind::keyword(word) {
            Some(kind) => Token::new(kind, position),
            None => Token::with_literal(
                TokenKind::Identifier,
                Literal::Text(word.to_string()),
                position,
            ),
        }
    }

    /// `digits` is an `i32` literal, `digits.digits` an `f32` literal. A
    /// period not followed by a digit is left for the next token.
    fn number(&mut self, position: Position) -> Result<Token, CompileError> {
        let whole = self.take_while(|c| c.is_ascii_digit());
        let is_float =
            self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit());

        if !is_float {
            let value: i32 = whole.parse().map_err(|_| {
                CompileError::lexical(position, LexicalError::LiteralOutOfRange(whole.to_string()))
            })?;
            return Ok(Token::with_literal(
                TokenKind::Int32Literal,
                Literal::Number(Value::I32(value)),
                position,
            ));
        }

        self.bump();
        let fraction = self.take_while(|c| c.is_ascii_digit());
        let text = format!("{whole}.{fraction}");
        let value: f32 = text.parse().map_err(|_| {
            CompileError::lexical(position, LexicalError::UnparsableLiteral(text.clone()))
        })?;
        if !value.is_finite() {
            return Err(CompileError::lexical(
                position,
                LexicalError::LiteralOutOfRange(text),
            ));
        }
        Ok(Token::with_literal(
            TokenKind::Float32Literal,
            Literal::Number(Value::F32(value)),
            position,
        ))
    }

    fn punctuator(&mut self, c: char, position: Position) -> Result<Token, CompileError> {
        self.bump();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => TokenKind::Equal,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Period,
            '<' => match self.peek() {
                Some('>') => self.followed_by(TokenKind::LessGreater),
                Some('=') => self.followed_by(TokenKind::LessEqual),
                _ => TokenKind::Less,
            },
            '>' => match self.peek() {
                Some('=') => self.followed_by(TokenKind::GreaterEqual),
                _ => TokenKind::Greater,
            },
            ':' => match self.peek() {
                Some('=') => self.followed_by(TokenKind::ColonEqual),
                _ => TokenKind::Colon,
            },
            other => {
                return Err(CompileError::lexical(
                    position,
                    LexicalError::UndefinedCharacter(other),
                ))
            }
        };
        Ok(Token::new(kind, position))
    }

    /// Consume the second character of a two-character punctuator.
    fn followed_by(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
