//! Listing: program → human-readable instruction text.
//!
//! One line per instruction, `<index>: <MNEMONIC> <L> <A>`, in emission
//! order. `OPR` lines name the sub-operation instead of its numeric code.

use std::fmt::Write;

use pl0_common::Program;

/// Render a program as a listing.
pub fn listing(program: &Program) -> String {
    let mut out = String::new();
    for (index, instr) in program.instructions.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{index}: {instr}");
    }
    out
}
