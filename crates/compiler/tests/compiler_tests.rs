//! Integration tests for the PL/0 compiler.
//!
//! Tests cover:
//! - The sample programs under `pl0-cli/tests/programs/` (compile, list, execute)
//! - Code shape: frame setup/release, procedure skipping, backpatching
//! - Static-link level differences for nested procedures
//! - Compile errors: lexical, syntax, and semantic, with positions
//! - Property tests: random integer expressions evaluate like Rust

use pl0_common::{Instruction, Opcode, Operator, Program, ScalarType, Value};
use pl0_compiler::{
    compile, compile_bytes, listing, CompileError, Expected, LexicalError, Position,
    SemanticError, SyntaxError, TokenKind,
};
use pl0_vm::{run_with, RuntimeError, State, VM};
use proptest::prelude::*;

// ============================================================
// Helper functions
// ============================================================

const SUM: &str = include_str!("../../../pl0-cli/tests/programs/sum.pl0");
const FACTORIAL: &str = include_str!("../../../pl0-cli/tests/programs/factorial.pl0");
const COUNT: &str = include_str!("../../../pl0-cli/tests/programs/count.pl0");
const FLOATS: &str = include_str!("../../../pl0-cli/tests/programs/floats.pl0");
const EUCLID: &str = include_str!("../../../pl0-cli/tests/programs/euclid.pl0");

/// Compile and run `source` with `input`, returning everything written.
fn run_source(source: &str, input: &str) -> Result<String, RuntimeError> {
    let program = compile(source).unwrap();
    let mut output = Vec::new();
    run_with(&program, input.as_bytes(), &mut output)?;
    Ok(String::from_utf8(output).unwrap())
}

/// Run to completion and return the VM's final stack.
fn final_stack(program: &Program) -> Vec<i32> {
    let mut vm = VM::new(program, &b""[..], Vec::new());
    vm.execute().unwrap();
    assert_eq!(vm.state(), State::Halted);
    vm.stack().to_vec()
}

fn semantic_error(source: &str) -> SemanticError {
    match compile(source).unwrap_err() {
        CompileError::Semantic { error, .. } => error,
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

/// Every `JMP`/`JPC` targets an address inside the program or its end.
fn assert_jumps_patched(program: &Program) {
    for (i, instr) in program.instructions.iter().enumerate() {
        if instr.is_jump() {
            assert!(
                instr.arg > 0 && instr.arg as usize <= program.len(),
                "instruction {i} ({instr}) has target {}",
                instr.arg
            );
        }
    }
}

// ============================================================
// Sample programs
// ============================================================

#[test]
fn sum_writes_three() {
    assert_eq!(run_source(SUM, "").unwrap(), "3\n");
}

#[test]
fn sum_listing() {
    let program = compile(SUM).unwrap();
    assert_eq!(
        listing(&program),
        "\
0: INT 0 1
1: LIT 0 1
2: LIT 0 2
3: OPR 0 Add
4: STO 0 0
5: LOD 0 0
6: WRT 0 0
7: INT 0 -1
"
    );
}

#[test]
fn nested_recursive_factorial() {
    assert_eq!(run_source(FACTORIAL, "").unwrap(), "120\n");
}

#[test]
fn factorial_recursion_walks_one_link() {
    let program = compile(FACTORIAL).unwrap();
    let calls: Vec<_> = program
        .instructions
        .iter()
        .filter(|i| i.opcode == Opcode::Cal)
        .map(|i| i.level)
        .collect();
    // fact calling itself, outer calling fact, main calling outer
    assert_eq!(calls, vec![1, 0, 0]);
}

#[test]
fn counting_loop_reaches_bound_once() {
    let output = run_source(COUNT, "").unwrap();
    assert_eq!(output, "10\n");
}

#[test]
fn floats_and_casts() {
    assert_eq!(run_source(FLOATS, "").unwrap(), "2.5\n10\n10.5\n");
}

#[test]
fn euclid_reads_input() {
    assert_eq!(run_source(EUCLID, "48 18\n").unwrap(), "6\n");
    assert_eq!(run_source(EUCLID, "7\n21\n").unwrap(), "7\n");
}

#[test]
fn euclid_without_input_faults() {
    assert!(matches!(
        run_source(EUCLID, ""),
        Err(RuntimeError::InputExhausted { .. })
    ));
}

#[test]
fn samples_leave_stack_empty() {
    for source in [SUM, FACTORIAL, COUNT, FLOATS] {
        let program = compile(source).unwrap();
        assert_eq!(final_stack(&program), Vec::<i32>::new());
    }
}

#[test]
fn samples_have_patched_jumps() {
    for source in [SUM, FACTORIAL, COUNT, FLOATS, EUCLID] {
        assert_jumps_patched(&compile(source).unwrap());
    }
}

// ============================================================
// Code shape
// ============================================================

#[test]
fn constants_occupy_frame_slots() {
    let program = compile("program p; const k := 4; var x: i32; begin x := k; end.").unwrap();
    assert_eq!(
        program.instructions,
        vec![
            Instruction::int(2),
            Instruction::lit(Value::I32(4)),
            Instruction::new(Opcode::Sto, 0, 0),
            Instruction::new(Opcode::Lod, 0, 0),
            Instruction::new(Opcode::Sto, 0, 1),
            Instruction::int(-2),
        ]
    );
}

#[test]
fn signed_constants() {
    let source = "program p; const k := -5, pi := +3.5; begin write(k); write(pi); end.";
    assert_eq!(run_source(source, "").unwrap(), "-5\n3.5\n");
}

#[test]
fn call_statement_discards_return_value() {
    let source = "\
program p;
procedure f(a: i32): i32;
begin return a; end
begin f(3); end.";
    let program = compile(source).unwrap();
    let n = program.len();
    assert_eq!(program.instructions[n - 4], Instruction::int(1));
    assert_eq!(program.instructions[n - 2].opcode, Opcode::Cal);
    assert_eq!(program.instructions[n - 1], Instruction::int(-2));
    assert_eq!(final_stack(&program), Vec::<i32>::new());
}

#[test]
fn call_expression_keeps_return_value() {
    let source = "\
program p;
procedure f(a: i32, b: i32): i32;
begin return a - b; end
begin write(f(10, 4)); end.";
    let program = compile(source).unwrap();
    let cal = program
        .instructions
        .iter()
        .position(|i| i.opcode == Opcode::Cal)
        .unwrap();
    assert_eq!(program.instructions[cal + 1], Instruction::int(-2));
    assert_eq!(run_source(source, "").unwrap(), "6\n");
}

#[test]
fn early_return_releases_locals() {
    let source = "\
program early;
var r: i32;
procedure f(n: i32): i32;
var t: i32;
begin
  t := n * 2;
  if t > 10 then return t;
  return 0;
end
begin
  r := f(7);
  write(r);
  write(f(2));
end.";
    assert_eq!(run_source(source, "").unwrap(), "14\n0\n");
    assert_eq!(final_stack(&compile(source).unwrap()), Vec::<i32>::new());
}

#[test]
fn main_return_halts() {
    let source = "program p; var x: i32; begin write(1); return; write(2); end.";
    assert_eq!(run_source(source, "").unwrap(), "1\n");
    assert_eq!(final_stack(&compile(source).unwrap()), Vec::<i32>::new());
}

#[test]
fn if_else_and_odd() {
    let source = "\
program p;
var i: i32;
begin
  i := 0;
  while i < 4 do
  begin
    if odd i then write(i); else write(0 - i);
    i := i + 1;
  end
end.";
    assert_eq!(run_source(source, "").unwrap(), "0\n1\n-2\n3\n");
}

#[test]
fn float_comparisons_drive_branches() {
    let source = "\
program p;
var x: f32;
begin
  read(x);
  if x >= 0.5 then write(1); else write(0);
  if x <> 0.75 then write(x);
end.";
    assert_eq!(run_source(source, "0.25").unwrap(), "0\n0.25\n");
    assert_eq!(run_source(source, "0.75").unwrap(), "1\n");
}

#[test]
fn inner_procedure_assigns_outer_variables() {
    let source = "\
program p;
var g: i32;
procedure a();
  var m: i32;
  procedure b();
  begin
    g := g + 1;
    m := m + 10;
  end
begin
  m := 0;
  b();
  b();
  g := g + m;
end
begin
  g := 1;
  a();
  write(g);
end.";
    assert_eq!(run_source(source, "").unwrap(), "23\n");
    let program = compile(source).unwrap();
    assert!(program
        .instructions
        .contains(&Instruction::new(Opcode::Sto, 2, 0)));
    assert!(program
        .instructions
        .contains(&Instruction::new(Opcode::Sto, 1, 0)));
}

#[test]
fn earlier_sibling_is_callable() {
    let source = "\
program p;
procedure a(): i32;
begin return 5; end
procedure b();
begin write(a()); end
begin b(); end.";
    assert_eq!(run_source(source, "").unwrap(), "5\n");
}

#[test]
fn local_shadows_global() {
    let source = "\
program p;
var x: i32;
procedure q();
var x: f32;
begin x := 1.5; write(x); end
begin x := 2; q(); write(x); end.";
    assert_eq!(run_source(source, "").unwrap(), "1.5\n2\n");
}

#[test]
fn division_by_zero_is_runtime_fault() {
    let source = "program p; var z: i32; begin z := 0; write(1 / z); end.";
    assert!(matches!(
        run_source(source, ""),
        Err(RuntimeError::DivisionByZero { .. })
    ));
}

#[test]
fn call_keyword_accepted() {
    let source = "program p; procedure q(); begin write(9); end begin call q(); end.";
    assert_eq!(run_source(source, "").unwrap(), "9\n");
}

#[test]
fn pascal_style_semicolons() {
    let source = "\
program p;
procedure q(a: f32);
begin
  write(a);
end;
begin
  q(1.25);
end.";
    assert_eq!(run_source(source, "").unwrap(), "1.25\n");
}

// ============================================================
// Compile errors
// ============================================================

#[test]
fn duplicate_variable() {
    let err = compile("program p; var x:i32, x:i32; begin write(1); end.").unwrap_err();
    assert_eq!(err.to_string(), "[语法错误] 位于1行23列: x重复定义");
}

#[test]
fn undefined_procedure() {
    let err = compile("program p; begin call undefinedProc(); end.").unwrap_err();
    assert_eq!(
        err,
        CompileError::semantic(
            Position::new(1, 23),
            SemanticError::UndefinedProcedure {
                name: "undefinedProc".to_string()
            }
        )
    );

    let err = compile("program p; begin undefinedProc(); end.").unwrap_err();
    assert_eq!(err.to_string(), "[语法错误] 位于1行18列: undefinedProc过程未定义");
}

#[test]
fn mixed_addition() {
    assert_eq!(
        semantic_error("program p; var a: i32; begin a := 1 + 1.0; end."),
        SemanticError::UnsupportedOperator {
            op: "+",
            left: ScalarType::I32,
            right: ScalarType::F32,
        }
    );
}

#[test]
fn undefined_variable() {
    assert_eq!(
        semantic_error("program p; begin y := 1; end."),
        SemanticError::UndefinedIdentifier {
            name: "y".to_string()
        }
    );
}

#[test]
fn later_sibling_is_not_visible() {
    let source = "\
program p;
procedure a(); begin b(); end
procedure b(); begin write(1); end
begin a(); end.";
    assert_eq!(
        semantic_error(source),
        SemanticError::UndefinedProcedure {
            name: "b".to_string()
        }
    );
}

#[test]
fn nephew_is_not_visible() {
    let source = "\
program p;
procedure a();
  procedure inner(); begin write(1); end
begin inner(); end
begin inner(); end.";
    assert_eq!(
        semantic_error(source),
        SemanticError::UndefinedProcedure {
            name: "inner".to_string()
        }
    );
}

#[test]
fn duplicate_procedure() {
    let source = "\
program p;
procedure a(); begin write(1); end
procedure a(); begin write(2); end
begin a(); end.";
    assert_eq!(
        semantic_error(source),
        SemanticError::DuplicateProcedure {
            name: "a".to_string()
        }
    );
}

#[test]
fn nested_procedure_may_not_reuse_enclosing_name() {
    let source = "\
program p;
procedure f();
  procedure f(); begin return; end
begin f(); end
begin f(); end.";
    let err = compile(source).unwrap_err();
    assert_eq!(
        err,
        CompileError::semantic(
            Position::new(3, 13),
            SemanticError::DuplicateProcedure {
                name: "f".to_string()
            }
        )
    );
}

#[test]
fn procedure_may_not_reuse_program_name() {
    assert_eq!(
        semantic_error("program p; procedure p(); begin return; end begin p(); end."),
        SemanticError::DuplicateProcedure {
            name: "p".to_string()
        }
    );
}

#[test]
fn duplicate_parameter() {
    let err = compile("program p; procedure f(a: i32, a: f32); begin return; end begin f(1, 1.0); end.")
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::semantic(
            Position::new(1, 32),
            SemanticError::DuplicateDefinition {
                name: "a".to_string()
            }
        )
    );
}

#[test]
fn argument_count_mismatch() {
    let source = "program p; procedure f(a: i32); begin write(a); end begin f(1, 2); end.";
    assert_eq!(
        semantic_error(source),
        SemanticError::ArgumentCount {
            procedure: "f".to_string(),
            expected: 1,
            found: 2,
        }
    );
}

#[test]
fn argument_type_mismatch() {
    let source = "program p; procedure f(a: i32, b: f32); begin write(a); end begin f(1, 2); end.";
    assert_eq!(
        semantic_error(source),
        SemanticError::ArgumentType {
            procedure: "f".to_string(),
            index: 2,
            expected: ScalarType::F32,
            found: ScalarType::I32,
        }
    );
}

#[test]
fn procedure_without_value_in_expression() {
    let source = "program p; var x: i32; procedure f(); begin return; end begin x := f(); end.";
    assert_eq!(
        semantic_error(source),
        SemanticError::NoReturnValue {
            procedure: "f".to_string()
        }
    );
}

#[test]
fn return_value_errors() {
    assert_eq!(
        semantic_error("program p; procedure f(): i32; begin return; end begin f(); end."),
        SemanticError::ReturnValueRequired
    );
    assert_eq!(
        semantic_error("program p; procedure f(); begin return 1; end begin f(); end."),
        SemanticError::UnexpectedReturnValue
    );
    assert_eq!(
        semantic_error("program p; procedure f(): f32; begin return 1; end begin f(); end."),
        SemanticError::ReturnTypeMismatch {
            expected: ScalarType::F32,
            found: ScalarType::I32,
        }
    );
    assert_eq!(
        semantic_error("program p; begin return 1; end."),
        SemanticError::UnexpectedReturnValue
    );
}

#[test]
fn constants_are_read_only() {
    assert_eq!(
        semantic_error("program p; const k := 1; begin k := 2; end."),
        SemanticError::AssignToConstant {
            name: "k".to_string()
        }
    );
    assert_eq!(
        semantic_error("program p; const k := 1; begin read(k); end."),
        SemanticError::AssignToConstant {
            name: "k".to_string()
        }
    );
}

#[test]
fn assignment_type_mismatch() {
    assert_eq!(
        semantic_error("program p; var x: f32; begin x := 1; end."),
        SemanticError::AssignTypeMismatch {
            from: ScalarType::I32,
            to: ScalarType::F32,
        }
    );
}

#[test]
fn odd_requires_integer() {
    assert_eq!(
        semantic_error("program p; begin if odd 1.0 then write(1); end."),
        SemanticError::OddRequiresInteger {
            found: ScalarType::F32
        }
    );
}

#[test]
fn missing_semicolon() {
    let err = compile("program p; var a: i32; begin a := 1 write(a); end.").unwrap_err();
    assert_eq!(
        err,
        CompileError::syntax(
            Position::new(1, 37),
            SyntaxError::Unexpected {
                expected: Expected::Tokens(vec![TokenKind::Semi]),
                found: "'write'".to_string(),
            }
        )
    );
    assert_eq!(
        err.to_string(),
        "[语法错误] 位于1行37列: 预期';'，但实际为'write'"
    );
}

#[test]
fn unterminated_body() {
    let err = compile("program p;\nbegin\n  write(1);\n").unwrap_err();
    assert_eq!(
        err,
        CompileError::syntax(
            Position::new(4, 1),
            SyntaxError::UnexpectedEof {
                expected: Expected::Statement
            }
        )
    );
}

#[test]
fn empty_body_rejected() {
    let err = compile("program p; begin end.").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Syntax {
            error: SyntaxError::Unexpected {
                expected: Expected::Statement,
                ..
            },
            ..
        }
    ));
}

#[test]
fn lexical_errors() {
    let err = compile("program p; begin write(1 $ 2); end.").unwrap_err();
    assert_eq!(err.to_string(), "[词法错误] 位于1行26列: 未定义的字符'$'");

    let err = compile("program p; begin write(99999999999); end.").unwrap_err();
    assert_eq!(
        err,
        CompileError::lexical(
            Position::new(1, 24),
            LexicalError::LiteralOutOfRange("99999999999".to_string())
        )
    );
}

#[test]
fn bytes_with_bom_compile_like_text() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(SUM.as_bytes());
    assert_eq!(compile_bytes(&bytes).unwrap(), compile(SUM).unwrap());
}

// ============================================================
// Properties
// ============================================================

/// Source for `depth` procedures nested inside each other, the innermost
/// of which writes the main program's variable.
fn nested_source(depth: usize) -> String {
    let mut source = String::from("program deep;\nvar v0: i32;\n");
    for d in 1..=depth {
        source.push_str(&format!("procedure p{d}();\nvar v{d}: i32;\n"));
    }
    source.push_str("begin write(v0); end\n");
    for d in (1..depth).rev() {
        source.push_str(&format!("begin p{}(); end\n", d + 1));
    }
    source.push_str("begin v0 := 42; p1(); end.\n");
    source
}

#[derive(Debug, Clone)]
enum Expr {
    Lit(i32),
    Neg(Box<Expr>),
    Bin(char, Box<Expr>, Box<Expr>),
    Div(Box<Expr>, i32),
}

impl Expr {
    fn render(&self) -> String {
        match self {
            Expr::Lit(v) => v.to_string(),
            Expr::Neg(e) => format!("(-{})", e.render()),
            Expr::Bin(op, l, r) => format!("({} {op} {})", l.render(), r.render()),
            Expr::Div(l, d) => format!("({} / {d})", l.render()),
        }
    }

    fn eval(&self) -> i32 {
        match self {
            Expr::Lit(v) => *v,
            Expr::Neg(e) => e.eval().wrapping_neg(),
            Expr::Bin('+', l, r) => l.eval().wrapping_add(r.eval()),
            Expr::Bin('-', l, r) => l.eval().wrapping_sub(r.eval()),
            Expr::Bin(_, l, r) => l.eval().wrapping_mul(r.eval()),
            Expr::Div(l, d) => l.eval().wrapping_div(*d),
        }
    }
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = (0..1000i32).prop_map(Expr::Lit);
    leaf.prop_recursive(5, 48, 2, |inner| {
        prop_oneof![
            (
                prop_oneof![Just('+'), Just('-'), Just('*')],
                inner.clone(),
                inner.clone()
            )
                .prop_map(|(op, l, r)| Expr::Bin(op, Box::new(l), Box::new(r))),
            (inner.clone(), 1..20i32).prop_map(|(l, d)| Expr::Div(Box::new(l), d)),
            inner.prop_map(|e| Expr::Neg(Box::new(e))),
        ]
    })
}

#[test]
fn level_difference_matches_nesting_depth() {
    for depth in 1..=6 {
        let source = nested_source(depth);
        let program = compile(&source).unwrap();
        assert!(
            program
                .instructions
                .contains(&Instruction::new(Opcode::Lod, depth as i32, 0)),
            "depth {depth}:\n{}",
            listing(&program)
        );
        assert_eq!(run_source(&source, "").unwrap(), "42\n");
    }
}

proptest! {
    /// A compiled expression prints what Rust computes for it.
    #[test]
    fn expressions_evaluate_like_rust(expr in arb_expr()) {
        let source = format!("program e; begin write({}); end.", expr.render());
        let output = run_source(&source, "").unwrap();
        prop_assert_eq!(output, format!("{}\n", expr.eval()));
    }

    /// Float literals reach the output unchanged.
    #[test]
    fn float_literals_round_trip(whole in 0..10_000i32, frac in 0..1000i32) {
        let text = format!("{whole}.{frac:03}");
        let expected: f32 = text.parse().unwrap();
        let source = format!("program f; begin write({text}); end.");
        let output = run_source(&source, "").unwrap();
        prop_assert_eq!(output, format!("{expected}\n"));
    }

    /// Loops run exactly `n` times and leave the stack balanced.
    #[test]
    fn while_loops_run_n_times(n in 0..200i32) {
        let source = format!(
            "program w; var i: i32, s: i32; begin i := 0; s := 0; \
             while i < {n} do begin s := s + 2; i := i + 1; end write(s); end."
        );
        let program = compile(&source).unwrap();
        let mut output = Vec::new();
        run_with(&program, &b""[..], &mut output).unwrap();
        prop_assert_eq!(String::from_utf8(output).unwrap(), format!("{}\n", 2 * n));
        prop_assert_eq!(final_stack(&program), Vec::<i32>::new());
    }

    /// Deeply nested references always resolve to their nesting depth.
    #[test]
    fn nested_reference_levels(depth in 1..12usize) {
        let program = compile(&nested_source(depth)).unwrap();
        let lods: Vec<_> = program
            .instructions
            .iter()
            .filter(|i| i.opcode == Opcode::Lod)
            .collect();
        prop_assert_eq!(lods.len(), 1);
        prop_assert_eq!(lods[0].level, depth as i32);
        prop_assert!(program
            .instructions
            .iter()
            .filter_map(|i| i.operator())
            .filter(|op| *op == Operator::Ret)
            .count() == depth);
    }
}
