//! Typed scalar values and their single-cell representation.
//!
//! The VM stack stores untyped `i32` cells. A `Value` pairs a cell with
//! the type the compiler inferred for it, so literals can travel through
//! code generation as raw bits and be reinterpreted only at use.

use std::fmt;

use crate::scalar::ScalarType;

/// A scalar value.
#[derive(Debug, Clone, Copy)]
pub enum Value {
    /// Signed 32-bit integer.
    I32(i32),
    /// Single-precision float.
    F32(f32),
}

// Floats compare by bit pattern so that `Value` is `Eq`; the compiler only
// needs equality to compare literal payloads, never IEEE ordering.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Returns the static type of this value.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Value::I32(_) => ScalarType::I32,
            Value::F32(_) => ScalarType::F32,
        }
    }

    /// Encode this value into one stack cell.
    pub fn to_cell(self) -> i32 {
        match self {
            Value::I32(v) => v,
            Value::F32(v) => v.to_bits() as i32,
        }
    }

    /// Decode a stack cell as a value of the given type.
    pub fn from_cell(cell: i32, ty: ScalarType) -> Self {
        match ty {
            ScalarType::I32 => Value::I32(cell),
            ScalarType::F32 => Value::F32(f32::from_bits(cell as u32)),
        }
    }

    /// Arithmetic negation, wrapping for `i32`.
    pub fn negate(self) -> Self {
        match self {
            Value::I32(v) => Value::I32(v.wrapping_neg()),
            Value::F32(v) => Value::F32(-v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
        }
    }
}
