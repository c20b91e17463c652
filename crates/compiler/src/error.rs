//! Diagnostics produced while compiling PL/0 source.
//!
//! Compilation stops at the first error. Every error carries the position
//! of the token it was reported at; end-of-input errors carry the position
//! just past the last character of the source.

use std::fmt;

use pl0_common::ScalarType;
use thiserror::Error;

use crate::token::{Position, TokenKind};

/// The first error encountered while compiling a program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("[词法错误] 位于{position}: {error}")]
    Lexical {
        position: Position,
        error: LexicalError,
    },

    #[error("[语法错误] 位于{position}: {error}")]
    Syntax {
        position: Position,
        error: SyntaxError,
    },

    /// Semantic errors are reported under the same heading as syntax
    /// errors; they are found by the same pass.
    #[error("[语法错误] 位于{position}: {error}")]
    Semantic {
        position: Position,
        error: SemanticError,
    },
}

impl CompileError {
    pub fn lexical(position: Position, error: LexicalError) -> Self {
        CompileError::Lexical { position, error }
    }

    pub fn syntax(position: Position, error: SyntaxError) -> Self {
        CompileError::Syntax { position, error }
    }

    pub fn semantic(position: Position, error: SemanticError) -> Self {
        CompileError::Semantic { position, error }
    }

    pub fn position(&self) -> Position {
        match self {
            CompileError::Lexical { position, .. }
            | CompileError::Syntax { position, .. }
            | CompileError::Semantic { position, .. } => *position,
        }
    }
}

/// Malformed input at the character level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("未定义的字符'{0}'")]
    UndefinedCharacter(char),

    #[error("无法解析的字面量{0}")]
    UnparsableLiteral(String),

    #[error("字面量{0}超出范围")]
    LiteralOutOfRange(String),
}

/// What the parser was looking for when it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Tokens(Vec<TokenKind>),
    Statement,
    Factor,
    EndOfInput,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Tokens(kinds) => {
                for (i, kind) in kinds.iter().enumerate() {
                    if i > 0 {
                        f.write_str("或")?;
                    }
                    write!(f, "{kind}")?;
                }
                Ok(())
            }
            Expected::Statement => f.write_str("语句"),
            Expected::Factor => f.write_str("因子"),
            Expected::EndOfInput => f.write_str("文件结束"),
        }
    }
}

/// The token stream does not match the grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("预期{expected}，但实际为{found}")]
    Unexpected { expected: Expected, found: String },

    #[error("预期{expected}，但已经到达文件尾部")]
    UnexpectedEof { expected: Expected },
}

/// Well-formed syntax that violates scoping or typing rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("{name}重复定义")]
    DuplicateDefinition { name: String },

    #[error("{name}过程重复定义")]
    DuplicateProcedure { name: String },

    #[error("{name}未定义")]
    UndefinedIdentifier { name: String },

    #[error("{name}过程未定义")]
    UndefinedProcedure { name: String },

    #[error("{procedure}过程需要{expected}个参数，但实际为{found}个")]
    ArgumentCount {
        procedure: String,
        expected: usize,
        found: usize,
    },

    #[error("{procedure}过程第{index}个参数应为{expected}，但实际为{found}")]
    ArgumentType {
        procedure: String,
        index: usize,
        expected: ScalarType,
        found: ScalarType,
    },

    #[error("{procedure}过程没有返回值，不能用于表达式")]
    NoReturnValue { procedure: String },

    #[error("过程需要返回值")]
    ReturnValueRequired,

    #[error("过程没有返回值")]
    UnexpectedReturnValue,

    #[error("返回值类型应为{expected}，但实际为{found}")]
    ReturnTypeMismatch {
        expected: ScalarType,
        found: ScalarType,
    },

    #[error("不能将{from}赋值给{to}")]
    AssignTypeMismatch { from: ScalarType, to: ScalarType },

    #[error("不能给常量{name}赋值")]
    AssignToConstant { name: String },

    #[error("不存在运算符{left} {op} {right}")]
    UnsupportedOperator {
        op: &'static str,
        left: ScalarType,
        right: ScalarType,
    },

    #[error("odd运算符只能用于i32，但实际为{found}")]
    OddRequiresInteger { found: ScalarType },
}
