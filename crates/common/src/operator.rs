//! Sub-operations dispatched by the `OPR` opcode.
//!
//! The operator is stored in the instruction's `A` field as its `i32`
//! sub-code. Float variants (prefixed `F`) reinterpret their operand cells
//! as IEEE-754 `f32` bit patterns.

use crate::error::DecodeError;

/// An `OPR` sub-operation.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Return from the current procedure, popping its three linkage cells.
    Ret = 0,

    // Integer
    Neg = 1,
    /// Replace the top cell with 1 if it is odd, else 0.
    Odd = 2,
    Add = 3,
    Sub = 4,
    Mul = 5,
    /// Truncating division. Division by zero is a runtime fault.
    Div = 6,
    Eql = 7,
    Neq = 8,
    Lss = 9,
    Leq = 10,
    Gtr = 11,
    Geq = 12,

    // Float. Comparisons push an integer 1 or 0.
    FNeg = 13,
    FAdd = 14,
    FSub = 15,
    FMul = 16,
    FDiv = 17,
    FEql = 18,
    FNeq = 19,
    FLss = 20,
    FLeq = 21,
    FGtr = 22,
    FGeq = 23,

    // Conversions
    /// `i32` to `f32`.
    IToF = 24,
    /// `f32` to `i32`, truncating toward zero.
    FToI = 25,
}

/// All operators, in sub-code order.
pub const ALL_OPERATORS: [Operator; 26] = [
    Operator::Ret,
    Operator::Neg,
    Operator::Odd,
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::Eql,
    Operator::Neq,
    Operator::Lss,
    Operator::Leq,
    Operator::Gtr,
    Operator::Geq,
    Operator::FNeg,
    Operator::FAdd,
    Operator::FSub,
    Operator::FMul,
    Operator::FDiv,
    Operator::FEql,
    Operator::FNeq,
    Operator::FLss,
    Operator::FLeq,
    Operator::FGtr,
    Operator::FGeq,
    Operator::IToF,
    Operator::FToI,
];

impl TryFrom<i32> for Operator {
    type Error = DecodeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|index| ALL_OPERATORS.get(index))
            .copied()
            .ok_or(DecodeError::UnknownOperator(value))
    }
}

impl Operator {
    /// The sub-code stored in an instruction's `A` field.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Returns the name shown for this operator in a listing.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Ret => "Ret",
            Operator::Neg => "Neg",
            Operator::Odd => "Odd",
            Operator::Add => "Add",
            Operator::Sub => "Sub",
            Operator::Mul => "Mul",
            Operator::Div => "Div",
            Operator::Eql => "Eql",
            Operator::Neq => "Neq",
            Operator::Lss => "Lss",
            Operator::Leq => "Leq",
            Operator::Gtr => "Gtr",
            Operator::Geq => "Geq",
            Operator::FNeg => "FNeg",
            Operator::FAdd => "FAdd",
            Operator::FSub => "FSub",
            Operator::FMul => "FMul",
            Operator::FDiv => "FDiv",
            Operator::FEql => "FEql",
            Operator::FNeq => "FNeq",
            Operator::FLss => "FLss",
            Operator::FLeq => "FLeq",
            Operator::FGtr => "FGtr",
            Operator::FGeq => "FGeq",
            Operator::IToF => "IToF",
            Operator::FToI => "FToI",
        }
    }
}
