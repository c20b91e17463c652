//! Decode errors for PL/0 instruction operands.

use thiserror::Error;

/// Errors that occur when an instruction operand cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The `A` field of an `OPR` instruction names no known operator.
    #[error("unknown operator sub-code: {0}")]
    UnknownOperator(i32),
}
