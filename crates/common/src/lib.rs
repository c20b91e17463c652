//! PL/0 common types: the stack-machine instruction set.
//!
//! This crate provides the data structures shared by the compiler and
//! the interpreter:
//!
//! - [`Opcode`]: the twelve machine opcodes
//! - [`Operator`]: sub-operations of `OPR`
//! - [`Instruction`]: the `F L A` instruction triple
//! - [`Program`]: the instruction vector
//! - [`ScalarType`] and [`Value`]: `i32`/`f32` scalars and their cell form
//! - [`DecodeError`]: errors interpreting instruction operands

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod operator;
pub mod program;
pub mod scalar;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::DecodeError;
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use operator::Operator;
pub use program::Program;
pub use scalar::ScalarType;
pub use value::Value;
