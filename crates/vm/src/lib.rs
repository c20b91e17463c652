//! PL/0 virtual machine: executes compiled instruction vectors.
//!
//! The VM is a stack machine with:
//! - One flat stack of 32-bit cells, each an `i32` or an `f32` bit pattern
//! - An instruction pointer and a base pointer
//! - Call frames linked by static links (for non-local variable access)
//!   and dynamic links (the saved base pointer)
//!
//! Frame layout, as built by the caller and `CAL`:
//!
//! ```text
//! bp - n - 4   return slot (only if the procedure returns a value)
//! bp - n - 3   first argument
//!   ...
//! bp - 4       last argument
//! bp - 3       static link   (base of the lexically enclosing frame)
//! bp - 2       return address
//! bp - 1       saved base pointer
//! bp + 0 ..    locals (constants first, then variables)
//! ```
//!
//! # Usage
//!
//! ```
//! use pl0_common::{Instruction, Opcode, Program, Value};
//! use pl0_vm::run_with;
//!
//! let program = Program::new(vec![
//!     Instruction::lit(Value::I32(42)),
//!     Instruction::new(Opcode::Wrt, 0, 0),
//! ]);
//!
//! let mut output = Vec::new();
//! run_with(&program, &b""[..], &mut output).unwrap();
//! assert_eq!(output, b"42\n");
//! ```

pub mod error;
pub mod execute;
pub mod machine;

pub use error::RuntimeError;
pub use machine::{State, LINKAGE_CELLS, MAX_STACK_DEPTH, VM};

use std::io::{self, BufRead, Write};

use pl0_common::Program;

/// Execute a program against standard input and standard output.
///
/// # Errors
///
/// Returns [`RuntimeError`] if execution faults (division by zero, stack
/// underflow, unknown operator, bad input, etc.).
pub fn run(program: &Program) -> Result<(), RuntimeError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with(program, stdin.lock(), stdout.lock())
}

/// Execute a program with the given input source and output sink.
///
/// `RED`/`FRED` consume whitespace-delimited tokens from `input`;
/// `WRT`/`FWRT` write one line per value to `output`.
pub fn run_with<R: BufRead, W: Write>(
    program: &Program,
    input: R,
    output: W,
) -> Result<(), RuntimeError> {
    let mut vm = VM::new(program, input, output);
    vm.execute()
}
