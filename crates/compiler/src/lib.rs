//! PL/0 compiler: source text to stack-machine code in a single pass.
//!
//! The parser pulls tokens from the lexer one at a time and emits
//! instructions as it recognizes each production. Nested procedures are
//! compiled in place and skipped over at runtime; forward jumps are
//! emitted with placeholder targets and patched once the target is known.
//!
//! # Usage
//!
//! ```
//! use pl0_compiler::{compile, listing};
//!
//! let program = compile("program p; var a: i32; begin a := 1 + 2; write(a); end.").unwrap();
//! assert!(listing(&program).starts_with("0: INT 0 1\n"));
//! ```
//!
//! # Errors
//!
//! Compilation stops at the first error. The error's `Display` is the
//! one-line diagnostic, e.g. `[语法错误] 位于1行9列: x未定义`.

pub mod context;
pub mod error;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod scope;
pub mod token;

mod listing;

pub use error::{CompileError, Expected, LexicalError, SemanticError, SyntaxError};
pub use parser::Parser;
pub use token::{Position, Token, TokenKind};

use pl0_common::Program;

const BOM: char = '\u{feff}';

/// Compile source text into a program.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    let source = source.strip_prefix(BOM).unwrap_or(source);
    Parser::new(source)?.program()
}

/// Compile raw source bytes. Invalid UTF-8 sequences become U+FFFD and
/// are then rejected by the lexer.
pub fn compile_bytes(bytes: &[u8]) -> Result<Program, CompileError> {
    compile(&String::from_utf8_lossy(bytes))
}

/// Render a program as a listing, one `<index>: <MNEMONIC> <L> <A>` line
/// per instruction.
pub fn listing(program: &Program) -> String {
    listing::listing(program)
}
