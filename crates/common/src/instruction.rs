//! The three-field instruction of the PL/0 stack machine.
//!
//! ```text
//! F: opcode
//! L: lexical level difference (frames to walk along static links)
//! A: operand (literal bits, frame offset, address, slot delta, sub-code)
//! ```

use std::fmt;

use crate::opcode::Opcode;
use crate::operator::Operator;
use crate::value::Value;

/// A single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Level difference. Read only by `LOD`, `STO`, `CAL`, `RED` and `FRED`.
    pub level: i32,
    /// Operand. Meaning depends on opcode.
    pub arg: i32,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(opcode: Opcode, level: i32, arg: i32) -> Self {
        Self { opcode, level, arg }
    }

    /// `LIT 0 value`, encoding floats as their bit pattern.
    pub fn lit(value: Value) -> Self {
        Self::new(Opcode::Lit, 0, value.to_cell())
    }

    /// `OPR 0 op`.
    pub fn opr(op: Operator) -> Self {
        Self::new(Opcode::Opr, 0, op.code())
    }

    /// `INT 0 delta`.
    pub fn int(delta: i32) -> Self {
        Self::new(Opcode::Int, 0, delta)
    }

    /// `JMP 0 target`.
    pub fn jmp(target: i32) -> Self {
        Self::new(Opcode::Jmp, 0, target)
    }

    /// `JPC 0 target`.
    pub fn jpc(target: i32) -> Self {
        Self::new(Opcode::Jpc, 0, target)
    }

    /// The operator of an `OPR` instruction, if this is one and its
    /// sub-code is known.
    pub fn operator(&self) -> Option<Operator> {
        if self.opcode != Opcode::Opr {
            return None;
        }
        Operator::try_from(self.arg).ok()
    }

    /// True for jumps whose target is patched after emission.
    pub fn is_jump(&self) -> bool {
        matches!(self.opcode, Opcode::Jmp | Opcode::Jpc)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator() {
            Some(op) => write!(f, "{} {} {}", self.opcode.mnemonic(), self.level, op.name()),
            None => write!(f, "{} {} {}", self.opcode.mnemonic(), self.level, self.arg),
        }
    }
}
