//! Opcode definitions for the PL/0 stack machine.
//!
//! Every instruction carries a level difference `L` and an operand `A`;
//! which of the two an opcode reads is noted on each variant.

/// Identifies the operation to perform.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Push `A` (an `i32` or the bit pattern of an `f32`).
    Lit = 0,
    /// Run the operator whose sub-code is `A`. See [`crate::Operator`].
    Opr = 1,
    /// Push the cell at offset `A` of the frame `L` static links out.
    Lod = 2,
    /// Pop into the cell at offset `A` of the frame `L` static links out.
    Sto = 3,
    /// Call the procedure at address `A`, declared `L` levels out.
    Cal = 4,
    /// Grow (or, if `A` is negative, shrink) the stack by `A` cells.
    Int = 5,
    /// Jump to address `A`.
    Jmp = 6,
    /// Pop; jump to address `A` if the popped cell is zero.
    Jpc = 7,
    /// Read an `i32` into the cell at offset `A` of the frame `L` out.
    Red = 8,
    /// Read an `f32` into the cell at offset `A` of the frame `L` out.
    Fred = 9,
    /// Pop and print an `i32`.
    Wrt = 10,
    /// Pop and print an `f32`.
    Fwrt = 11,
}

impl Opcode {
    /// Returns the listing mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Lit => "LIT",
            Opcode::Opr => "OPR",
            Opcode::Lod => "LOD",
            Opcode::Sto => "STO",
            Opcode::Cal => "CAL",
            Opcode::Int => "INT",
            Opcode::Jmp => "JMP",
            Opcode::Jpc => "JPC",
            Opcode::Red => "RED",
            Opcode::Fred => "FRED",
            Opcode::Wrt => "WRT",
            Opcode::Fwrt => "FWRT",
        }
    }
}
