//! Program representation: the linear instruction vector.
//!
//! The code generator appends to and backpatches the vector; once
//! compilation finishes the program is handed to the VM read-only.

use crate::instruction::Instruction;

/// A compiled program: instructions addressed by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// The instruction stream.
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Create a new program from a vector of instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction at `address`, if in range.
    pub fn get(&self, address: usize) -> Option<&Instruction> {
        self.instructions.get(address)
    }
}
