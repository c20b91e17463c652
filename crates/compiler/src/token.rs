//! Tokens delivered by the lexer to the parser.

use std::fmt;

use pl0_common::Value;

/// A 1-based source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: u32,
    pub column: u32,
}

impl Position {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { row: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}行{}列", self.row, self.column)
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Program,
    Const,
    Var,
    Procedure,
    Begin,
    End,
    If,
    Then,
    Else,
    While,
    Do,
    Odd,
    Read,
    Write,
    Return,
    I32,
    F32,

    // Carry a payload
    Identifier,
    Int32Literal,
    Float32Literal,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    LessGreater,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Punctuation
    LParen,
    RParen,
    Semi,
    Comma,
    Colon,
    ColonEqual,
    Period,
}

/// Reserved words and the token kinds they lex to.
pub const KEYWORDS: [(&str, TokenKind); 17] = [
    ("program", TokenKind::Program),
    ("const", TokenKind::Const),
    ("var", TokenKind::Var),
    ("procedure", TokenKind::Procedure),
    ("begin", TokenKind::Begin),
    ("end", TokenKind::End),
    ("if", TokenKind::If),
    ("then", TokenKind::Then),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("do", TokenKind::Do),
    ("odd", TokenKind::Odd),
    ("read", TokenKind::Read),
    ("write", TokenKind::Write),
    ("return", TokenKind::Return),
    ("i32", TokenKind::I32),
    ("f32", TokenKind::F32),
];

impl TokenKind {
    /// The keyword kind spelled `word`, if it is reserved.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == word)
            .map(|(_, kind)| *kind)
    }

    /// Fixed spelling of keywords and punctuators; `None` for token
    /// classes whose text varies.
    pub fn spelling(&self) -> Option<&'static str> {
        let s = match self {
            TokenKind::Identifier | TokenKind::Int32Literal | TokenKind::Float32Literal => {
                return None
            }
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Equal => "=",
            TokenKind::LessGreater => "<>",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Semi => ";",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::ColonEqual => ":=",
            TokenKind::Period => ".",
            keyword => {
                return KEYWORDS
                    .iter()
                    .find(|(_, kind)| kind == keyword)
                    .map(|(spelling, _)| *spelling)
            }
        };
        Some(s)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.spelling()) {
            (_, Some(s)) => write!(f, "'{s}'"),
            (TokenKind::Identifier, None) => f.write_str("标识符"),
            (TokenKind::Int32Literal, None) => f.write_str("整数"),
            (_, None) => f.write_str("浮点数"),
        }
    }
}

/// Payload of identifier and literal tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Text(String),
    Number(Value),
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Option<Literal>,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self {
            kind,
            literal: None,
            position,
        }
    }

    pub fn with_literal(kind: TokenKind, literal: Literal, position: Position) -> Self {
        Self {
            kind,
            literal: Some(literal),
            position,
        }
    }

    /// Identifier text; empty for other tokens.
    pub fn text(&self) -> &str {
        match &self.literal {
            Some(Literal::Text(s)) => s,
            _ => "",
        }
    }

    /// Numeric payload of a literal token.
    pub fn number(&self) -> Option<Value> {
        match &self.literal {
            Some(Literal::Number(v)) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(Literal::Text(s)) => write!(f, "{}'{s}'", self.kind),
            Some(Literal::Number(v)) => write!(f, "{}'{v}'", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}
