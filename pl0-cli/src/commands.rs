//! CLI command implementations.

use std::fs;
use std::io::{self, Write};

use pl0_common::Program;

/// Compile the source file at `path`, print its listing, and execute it.
pub fn run(path: &str) -> Result<(), i32> {
    let program = compile(path)?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(pl0_compiler::listing(&program).as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| {
            eprintln!("error: cannot write listing: {e}");
            1
        })?;
    drop(stdout);

    pl0_vm::run(&program).map_err(|e| {
        eprintln!("runtime error: {e}");
        3
    })
}

/// Read and compile a source file.
fn compile(path: &str) -> Result<Program, i32> {
    let bytes = fs::read(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    pl0_compiler::compile_bytes(&bytes).map_err(|e| {
        eprintln!("{e}");
        2
    })
}
