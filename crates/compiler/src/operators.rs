//! Typed operator dispatch: which machine operator implements a source
//! operator for a pair of operand types, and the type of the result.

use pl0_common::{Operator, ScalarType};

use crate::token::TokenKind;

use BinaryOp as B;
use Operator as O;
use ScalarType::{F32, I32};

/// A binary operator as written in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eql,
    Neq,
    Lss,
    Leq,
    Gtr,
    Geq,
}

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> Option<BinaryOp> {
        let op = match kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Equal => BinaryOp::Eql,
            TokenKind::LessGreater => BinaryOp::Neq,
            TokenKind::Less => BinaryOp::Lss,
            TokenKind::LessEqual => BinaryOp::Leq,
            TokenKind::Greater => BinaryOp::Gtr,
            TokenKind::GreaterEqual => BinaryOp::Geq,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eql => "=",
            BinaryOp::Neq => "<>",
            BinaryOp::Lss => "<",
            BinaryOp::Leq => "<=",
            BinaryOp::Gtr => ">",
            BinaryOp::Geq => ">=",
        }
    }
}

/// Relational operators accepted in a condition.
pub const COMPARISONS: [TokenKind; 6] = [
    TokenKind::Equal,
    TokenKind::LessGreater,
    TokenKind::Less,
    TokenKind::LessEqual,
    TokenKind::Greater,
    TokenKind::GreaterEqual,
];

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorEntry {
    pub op: BinaryOp,
    pub left: ScalarType,
    pub right: ScalarType,
    pub operator: Operator,
    pub result: ScalarType,
}

const fn entry(
    op: BinaryOp,
    operand: ScalarType,
    operator: Operator,
    result: ScalarType,
) -> OperatorEntry {
    OperatorEntry {
        op,
        left: operand,
        right: operand,
        operator,
        result,
    }
}

/// Operand types must match exactly; there are no implicit conversions.
/// Comparisons yield `i32` whatever their operand type.
pub const BINARY_OPERATORS: [OperatorEntry; 20] = [
    entry(B::Add, I32, O::Add, I32),
    entry(B::Sub, I32, O::Sub, I32),
    entry(B::Mul, I32, O::Mul, I32),
    entry(B::Div, I32, O::Div, I32),
    entry(B::Eql, I32, O::Eql, I32),
    entry(B::Neq, I32, O::Neq, I32),
    entry(B::Lss, I32, O::Lss, I32),
    entry(B::Leq, I32, O::Leq, I32),
    entry(B::Gtr, I32, O::Gtr, I32),
    entry(B::Geq, I32, O::Geq, I32),
    entry(B::Add, F32, O::FAdd, F32),
    entry(B::Sub, F32, O::FSub, F32),
    entry(B::Mul, F32, O::FMul, F32),
    entry(B::Div, F32, O::FDiv, F32),
    entry(B::Eql, F32, O::FEql, I32),
    entry(B::Neq, F32, O::FNeq, I32),
    entry(B::Lss, F32, O::FLss, I32),
    entry(B::Leq, F32, O::FLeq, I32),
    entry(B::Gtr, F32, O::FGtr, I32),
    entry(B::Geq, F32, O::FGeq, I32),
];

/// Look up the entry for `left op right`.
pub fn lookup_binary(op: BinaryOp, left: ScalarType, right: ScalarType) -> Option<OperatorEntry> {
    BINARY_OPERATORS
        .iter()
        .find(|e| e.op == op && e.left == left && e.right == right)
        .copied()
}

/// The negation operator for an operand type. Result type equals operand
/// type.
pub fn negation(ty: ScalarType) -> Operator {
    match ty {
        I32 => O::Neg,
        F32 => O::FNeg,
    }
}
