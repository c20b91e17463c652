//! The two scalar types of the language.

use std::fmt;

/// The static type of a variable, parameter, return slot, or expression.
///
/// Both types occupy exactly one 32-bit stack cell at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Signed 32-bit integer.
    I32,
    /// IEEE-754 single-precision float, stored in a cell as its bit pattern.
    F32,
}

impl ScalarType {
    /// Returns the source-level spelling of this type.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::I32 => "i32",
            ScalarType::F32 => "f32",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
