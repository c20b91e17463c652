//! Runtime faults for the PL/0 VM.
//!
//! A correctly compiled program cannot trigger the stack and operator
//! faults below; they indicate a compiler/VM consistency violation. The
//! input faults are the only ones a user can cause. Every variant carries
//! the index of the faulting instruction (`at`).

use thiserror::Error;

/// Errors that abort program execution. Execution never resumes after one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Integer or float division by zero.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// A pop, negative `INT`, or static-link walk reached below the current
    /// frame or the bottom of the stack.
    #[error("stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    /// The stack grew past [`crate::MAX_STACK_DEPTH`] cells.
    #[error("stack overflow at instruction {at}")]
    StackOverflow { at: usize },

    /// `OPR` with a sub-code that names no operator.
    #[error("unknown operator sub-code {code} at instruction {at}")]
    UnknownOperator { at: usize, code: i32 },

    /// A frame address resolved above the live stack top.
    #[error("frame address {address} out of range (stack size {size}) at instruction {at}")]
    AddressOutOfRange { at: usize, address: i64, size: usize },

    /// `Ret` on a frame whose locals were not released, or linkage cells
    /// holding impossible values.
    #[error("corrupt call frame at instruction {at}")]
    CorruptFrame { at: usize },

    /// A jump or call target outside the program.
    #[error("invalid target {target} at instruction {at}")]
    InvalidTarget { at: usize, target: i32 },

    /// The instruction pointer moved past the end of the program.
    #[error("unexpected end of program at instruction {at}")]
    UnexpectedEndOfProgram { at: usize },

    /// `RED`/`FRED` read a token that is not a scalar of the expected type.
    #[error("invalid input '{token}' at instruction {at}")]
    InvalidInput { at: usize, token: String },

    /// `RED`/`FRED` found no more input.
    #[error("input exhausted at instruction {at}")]
    InputExhausted { at: usize },

    /// Reading input or writing output failed.
    #[error("i/o error at instruction {at}: {message}")]
    Io { at: usize, message: String },
}
