//! PL/0 CLI: compile a source file, print its listing, and run it.
//!
//! Exit codes:
//! - 0: Success, or usage printed
//! - 1: Source file cannot be read
//! - 2: Compile error
//! - 3: Runtime error

mod commands;

use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let path = match args.as_slice() {
        [_, path] if path != "--help" && path != "-h" => path,
        _ => {
            print_usage();
            return;
        }
    };

    if let Err(code) = commands::run(path) {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: pl0 <source-file>");
    eprintln!();
    eprintln!("Compiles the program, prints its instruction listing, then runs it.");
    eprintln!("read() takes whitespace-separated values from standard input.");
}
