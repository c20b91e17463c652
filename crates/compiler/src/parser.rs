//! Recursive-descent parser and code generator.
//!
//! Each production validates its tokens and emits code into the
//! [`Context`] it is handed in the same pass. Expression productions
//! return the static type of the value they leave on the stack.

use pl0_common::{Instruction, Opcode, Operator, Program, ScalarType, Value};

use crate::context::{CallTarget, Context};
use crate::error::{CompileError, Expected, SemanticError, SyntaxError};
use crate::lexer::Lexer;
use crate::operators::{lookup_binary, negation, BinaryOp, COMPARISONS};
use crate::scope::Attribute;
use crate::token::{Position, Token, TokenKind};

type Result<T> = std::result::Result<T, CompileError>;

/// How a call's result is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallUsage {
    /// The return value, if any, is discarded.
    Statement,
    /// The return value stays on the stack.
    Expression,
}

/// A parser over one source text with a single token of lookahead.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token>,
}

fn semantic_at(position: Position) -> impl FnOnce(SemanticError) -> CompileError {
    move |error| CompileError::semantic(position, error)
}

fn literal_value(token: &Token) -> Result<Value> {
    token.number().ok_or_else(|| {
        CompileError::syntax(
            token.position,
            SyntaxError::Unexpected {
                expected: Expected::Tokens(vec![
                    TokenKind::Int32Literal,
                    TokenKind::Float32Literal,
                ]),
                found: token.to_string(),
            },
        )
    })
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let lookahead = lexer.next_token()?;
        Ok(Self { lexer, lookahead })
    }

    // ---- Token handling ----

    fn check(&self, kind: TokenKind) -> bool {
        self.lookahead.as_ref().is_some_and(|t| t.kind == kind)
    }

    fn unexpected(&self, expected: Expected) -> CompileError {
        match &self.lookahead {
            Some(token) => CompileError::syntax(
                token.position,
                SyntaxError::Unexpected {
                    expected,
                    found: token.to_string(),
                },
            ),
            None => CompileError::syntax(
                self.lexer.position(),
                SyntaxError::UnexpectedEof { expected },
            ),
        }
    }

    /// The lookahead token, or an error naming what was expected.
    fn current(&self, expected: Expected) -> Result<Token> {
        self.lookahead
            .clone()
            .ok_or_else(|| self.unexpected(expected))
    }

    /// Consume the lookahead if it is one of `kinds`.
    fn expect_one_of(&mut self, kinds: &[TokenKind]) -> Result<Token> {
        match self.lookahead.take() {
            Some(token) if kinds.contains(&token.kind) => {
                self.lookahead = self.lexer.next_token()?;
                Ok(token)
            }
            other => {
                self.lookahead = other;
                Err(self.unexpected(Expected::Tokens(kinds.to_vec())))
            }
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        self.expect_one_of(&[kind])
    }

    /// Consume the lookahead if it is `kind`.
    fn eat(&mut self, kind: TokenKind) -> Result<Option<Token>> {
        if self.check(kind) {
            self.expect(kind).map(Some)
        } else {
            Ok(None)
        }
    }

    // ---- Declarations ----

    /// `prog -> "program" id ";" block ["."]`, then end of input.
    pub fn program(&mut self) -> Result<Program> {
        self.expect(TokenKind::Program)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::Semi)?;

        let mut ctx = Context::new(name.text());
        self.block(&mut ctx)?;
        self.eat(TokenKind::Period)?;
        if self.lookahead.is_some() {
            return Err(self.unexpected(Expected::EndOfInput));
        }
        Ok(ctx.finish())
    }

    /// `block -> [condecl] [vardecl] [procs] body`
    pub fn block(&mut self, ctx: &mut Context) -> Result<()> {
        if self.check(TokenKind::Const) {
            self.const_declarations(ctx)?;
        }
        if self.check(TokenKind::Var) {
            self.var_declarations(ctx)?;
        }
        ctx.emit_frame_setup();

        if self.check(TokenKind::Procedure) {
            let skip = ctx.emit(Instruction::jmp(0));
            while self.check(TokenKind::Procedure) {
                self.procedure(ctx)?;
            }
            ctx.patch_here(skip);
        }

        self.body(ctx)?;
        ctx.emit_frame_release();
        Ok(())
    }

    fn const_declarations(&mut self, ctx: &mut Context) -> Result<()> {
        self.expect(TokenKind::Const)?;
        loop {
            let name = self.expect(TokenKind::Identifier)?;
            self.expect(TokenKind::ColonEqual)?;
            let negate = self.sign()?;
            let literal =
                self.expect_one_of(&[TokenKind::Int32Literal, TokenKind::Float32Literal])?;
            let mut value = literal_value(&literal)?;
            if negate {
                value = value.negate();
            }
            ctx.declare(
                Attribute::Const,
                value.scalar_type(),
                name.text(),
                Some(value),
            )
            .map_err(semantic_at(name.position))?;

            if self.eat(TokenKind::Comma)?.is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    fn var_declarations(&mut self, ctx: &mut Context) -> Result<()> {
        self.expect(TokenKind::Var)?;
        loop {
            let name = self.expect(TokenKind::Identifier)?;
            self.expect(TokenKind::Colon)?;
            let ty = self.scalar_type()?;
            ctx.declare(Attribute::Var, ty, name.text(), None)
                .map_err(semantic_at(name.position))?;

            if self.eat(TokenKind::Comma)?.is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    fn scalar_type(&mut self) -> Result<ScalarType> {
        let token = self.expect_one_of(&[TokenKind::I32, TokenKind::F32])?;
        Ok(match token.kind {
            TokenKind::F32 => ScalarType::F32,
            _ => ScalarType::I32,
        })
    }

    /// An optional leading sign; true if it negates.
    fn sign(&mut self) -> Result<bool> {
        if self.eat(TokenKind::Minus)?.is_some() {
            return Ok(true);
        }
        self.eat(TokenKind::Plus)?;
        Ok(false)
    }

    /// `procedure -> "procedure" id "(" [params] ")" [":" type] [";"] block [";"]`
    ///
    /// The body is compiled in place; the enclosing block jumps over it.
    fn procedure(&mut self, ctx: &mut Context) -> Result<()> {
        self.expect(TokenKind::Procedure)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::LParen)?;

        let mut params: Vec<(String, ScalarType)> = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param = self.expect(TokenKind::Identifier)?;
                self.expect(TokenKind::Colon)?;
                let ty = self.scalar_type()?;
                if params.iter().any(|(p, _)| p == param.text()) {
                    return Err(CompileError::semantic(
                        param.position,
                        SemanticError::DuplicateDefinition {
                            name: param.text().to_string(),
                        },
                    ));
                }
                params.push((param.text().to_string(), ty));

                if self.eat(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let ret = match self.eat(TokenKind::Colon)? {
            Some(_) => Some(self.scalar_type()?),
            None => None,
        };
        self.eat(TokenKind::Semi)?;

        let id = ctx
            .declare_procedure(name.text(), params, ret)
            .map_err(semantic_at(name.position))?;
        ctx.enter(id);
        self.block(ctx)?;
        ctx.emit(Instruction::opr(Operator::Ret));
        ctx.leave();

        self.eat(TokenKind::Semi)?;
        Ok(())
    }

    // ---- Statements ----

    /// `body -> "begin" statement {statement} "end"`
    fn body(&mut self, ctx: &mut Context) -> Result<()> {
        self.expect(TokenKind::Begin)?;
        loop {
            self.statement(ctx)?;
            if self.eat(TokenKind::End)?.is_some() {
                return Ok(());
            }
        }
    }

    pub fn statement(&mut self, ctx: &mut Context) -> Result<()> {
        let token = self.current(Expected::Statement)?;
        match token.kind {
            TokenKind::Identifier => self.assignment_or_call(ctx),
            TokenKind::If => self.if_statement(ctx),
            TokenKind::While => self.while_statement(ctx),
            TokenKind::Begin => self.body(ctx),
            TokenKind::Read => self.read_statement(ctx),
            TokenKind::Write => self.write_statement(ctx),
            TokenKind::Return => self.return_statement(ctx),
            _ => Err(self.unexpected(Expected::Statement)),
        }
    }

    /// `id ":=" exp ";"` or `id "(" [args] ")" ";"`. A leading `call` is
    /// accepted before the procedure name.
    fn assignment_or_call(&mut self, ctx: &mut Context) -> Result<()> {
        let mut name = self.expect(TokenKind::Identifier)?;
        if name.text() == "call" && self.check(TokenKind::Identifier) {
            name = self.expect(TokenKind::Identifier)?;
            self.expect(TokenKind::LParen)?;
            self.call(ctx, &name, CallUsage::Statement)?;
            self.expect(TokenKind::Semi)?;
            return Ok(());
        }

        let next = self.expect_one_of(&[TokenKind::ColonEqual, TokenKind::LParen])?;
        if next.kind == TokenKind::LParen {
            self.call(ctx, &name, CallUsage::Statement)?;
            self.expect(TokenKind::Semi)?;
            return Ok(());
        }

        let var = ctx.resolve_var(name.text()).ok_or_else(|| {
            CompileError::semantic(
                name.position,
                SemanticError::UndefinedIdentifier {
                    name: name.text().to_string(),
                },
            )
        })?;
        if var.attribute == Attribute::Const {
            return Err(CompileError::semantic(
                name.position,
                SemanticError::AssignToConstant {
                    name: name.text().to_string(),
                },
            ));
        }

        let ty = self.expression(ctx)?;
        if ty != var.ty {
            return Err(CompileError::semantic(
                next.position,
                SemanticError::AssignTypeMismatch {
                    from: ty,
                    to: var.ty,
                },
            ));
        }
        self.expect(TokenKind::Semi)?;
        ctx.emit(Instruction::new(Opcode::Sto, var.level, var.offset));
        Ok(())
    }

    /// `if lexp then statement [else statement]`
    fn if_statement(&mut self, ctx: &mut Context) -> Result<()> {
        self.expect(TokenKind::If)?;
        self.condition(ctx)?;
        let branch = ctx.emit(Instruction::jpc(0));
        self.expect(TokenKind::Then)?;
        self.statement(ctx)?;

        if self.eat(TokenKind::Else)?.is_some() {
            let skip = ctx.emit(Instruction::jmp(0));
            ctx.patch_here(branch);
            self.statement(ctx)?;
            ctx.patch_here(skip);
        } else {
            ctx.patch_here(branch);
        }
        Ok(())
    }

    /// `while lexp do statement`
    fn while_statement(&mut self, ctx: &mut Context) -> Result<()> {
        self.expect(TokenKind::While)?;
        let start = ctx.here();
        self.condition(ctx)?;
        let exit = ctx.emit(Instruction::jpc(0));
        self.expect(TokenKind::Do)?;
        self.statement(ctx)?;
        ctx.emit(Instruction::jmp(start));
        ctx.patch_here(exit);
        Ok(())
    }

    /// `read "(" id {"," id} ")" ";"`
    fn read_statement(&mut self, ctx: &mut Context) -> Result<()> {
        self.expect(TokenKind::Read)?;
        self.expect(TokenKind::LParen)?;
        loop {
            let name = self.expect(TokenKind::Identifier)?;
            let var = ctx.resolve_var(name.text()).ok_or_else(|| {
                CompileError::semantic(
                    name.position,
                    SemanticError::UndefinedIdentifier {
                        name: name.text().to_string(),
                    },
                )
            })?;
            if var.attribute == Attribute::Const {
                return Err(CompileError::semantic(
                    name.position,
                    SemanticError::AssignToConstant {
                        name: name.text().to_string(),
                    },
                ));
            }
            let opcode = match var.ty {
                ScalarType::I32 => Opcode::Red,
                ScalarType::F32 => Opcode::Fred,
            };
            ctx.emit(Instruction::new(opcode, var.level, var.offset));

            if self.eat(TokenKind::Comma)?.is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    /// `write "(" exp {"," exp} ")" ";"`
    fn write_statement(&mut self, ctx: &mut Context) -> Result<()> {
        self.expect(TokenKind::Write)?;
        self.expect(TokenKind::LParen)?;
        loop {
            let opcode = match self.expression(ctx)? {
                ScalarType::I32 => Opcode::Wrt,
                ScalarType::F32 => Opcode::Fwrt,
            };
            ctx.emit(Instruction::new(opcode, 0, 0));

            if self.eat(TokenKind::Comma)?.is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    /// `return [exp] ";"`. Every exit releases the frame's locals first.
    fn return_statement(&mut self, ctx: &mut Context) -> Result<()> {
        let keyword = self.expect(TokenKind::Return)?;
        let slot = ctx.current_scope().ret.as_ref().map(|r| (r.ty, r.offset));

        if self.eat(TokenKind::Semi)?.is_some() {
            if slot.is_some() {
                return Err(CompileError::semantic(
                    keyword.position,
                    SemanticError::ReturnValueRequired,
                ));
            }
            ctx.emit_frame_release();
            ctx.emit_exit();
            return Ok(());
        }

        let Some((expected, offset)) = slot else {
            return Err(CompileError::semantic(
                keyword.position,
                SemanticError::UnexpectedReturnValue,
            ));
        };
        let found = self.expression(ctx)?;
        if found != expected {
            return Err(CompileError::semantic(
                keyword.position,
                SemanticError::ReturnTypeMismatch { expected, found },
            ));
        }
        self.expect(TokenKind::Semi)?;
        ctx.emit(Instruction::new(Opcode::Sto, 0, offset));
        ctx.emit_frame_release();
        ctx.emit_exit();
        Ok(())
    }

    /// Compile a call whose name and `(` have been consumed, up to and
    /// including the closing `)`. Returns the procedure's return type.
    fn call(
        &mut self,
        ctx: &mut Context,
        name: &Token,
        usage: CallUsage,
    ) -> Result<Option<ScalarType>> {
        let target: CallTarget = ctx.resolve_procedure(name.text()).ok_or_else(|| {
            CompileError::semantic(
                name.position,
                SemanticError::UndefinedProcedure {
                    name: name.text().to_string(),
                },
            )
        })?;

        let reserved = match (target.ret, usage) {
            (Some(_), _) => {
                ctx.emit(Instruction::int(1));
                1
            }
            (None, CallUsage::Expression) => {
                return Err(CompileError::semantic(
                    name.position,
                    SemanticError::NoReturnValue {
                        procedure: target.name,
                    },
                ))
            }
            (None, CallUsage::Statement) => 0,
        };

        let mut args = Vec::new();
        if self.eat(TokenKind::RParen)?.is_none() {
            loop {
                let position = self.current(Expected::Factor)?.position;
                args.push((position, self.expression(ctx)?));
                if self.eat(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        if args.len() != target.params.len() {
            return Err(CompileError::semantic(
                name.position,
                SemanticError::ArgumentCount {
                    procedure: target.name,
                    expected: target.params.len(),
                    found: args.len(),
                },
            ));
        }
        for (i, ((position, found), expected)) in args.iter().zip(&target.params).enumerate() {
            if found != expected {
                return Err(CompileError::semantic(
                    *position,
                    SemanticError::ArgumentType {
                        procedure: target.name,
                        index: i + 1,
                        expected: *expected,
                        found: *found,
                    },
                ));
            }
        }

        ctx.emit(Instruction::new(
            Opcode::Cal,
            target.level,
            target.entry as i32,
        ));
        let argc = args.len() as i32;
        let release = match usage {
            CallUsage::Statement => argc + reserved,
            CallUsage::Expression => argc,
        };
        if release > 0 {
            ctx.emit(Instruction::int(-release));
        }
        Ok(target.ret)
    }

    // ---- Expressions ----

    /// `lexp -> "odd" exp | exp lop exp`. Leaves an `i32` truth value.
    pub fn condition(&mut self, ctx: &mut Context) -> Result<()> {
        if let Some(odd) = self.eat(TokenKind::Odd)? {
            let found = self.expression(ctx)?;
            if found != ScalarType::I32 {
                return Err(CompileError::semantic(
                    odd.position,
                    SemanticError::OddRequiresInteger { found },
                ));
            }
            ctx.emit(Instruction::opr(Operator::Odd));
            return Ok(());
        }

        let left = self.expression(ctx)?;
        let op = self.expect_one_of(&COMPARISONS)?;
        let right = self.expression(ctx)?;
        self.binary(ctx, &op, left, right)?;
        Ok(())
    }

    /// `exp -> ["+" | "-"] term {("+" | "-") term}`
    pub fn expression(&mut self, ctx: &mut Context) -> Result<ScalarType> {
        let negate = self.sign()?;
        let mut ty = self.term(ctx)?;
        if negate {
            ctx.emit(Instruction::opr(negation(ty)));
        }
        while self.check(TokenKind::Plus) || self.check(TokenKind::Minus) {
            let op = self.expect_one_of(&[TokenKind::Plus, TokenKind::Minus])?;
            let right = self.term(ctx)?;
            ty = self.binary(ctx, &op, ty, right)?;
        }
        Ok(ty)
    }

    /// `term -> factor {("*" | "/") factor}`
    fn term(&mut self, ctx: &mut Context) -> Result<ScalarType> {
        let mut ty = self.factor(ctx)?;
        while self.check(TokenKind::Star) || self.check(TokenKind::Slash) {
            let op = self.expect_one_of(&[TokenKind::Star, TokenKind::Slash])?;
            let right = self.factor(ctx)?;
            ty = self.binary(ctx, &op, ty, right)?;
        }
        Ok(ty)
    }

    fn factor(&mut self, ctx: &mut Context) -> Result<ScalarType> {
        let token = self.current(Expected::Factor)?;
        match token.kind {
            TokenKind::Identifier => {
                let name = self.expect(TokenKind::Identifier)?;
                if self.eat(TokenKind::LParen)?.is_some() {
                    let ret = self.call(ctx, &name, CallUsage::Expression)?;
                    return ret.ok_or_else(|| {
                        CompileError::semantic(
                            name.position,
                            SemanticError::NoReturnValue {
                                procedure: name.text().to_string(),
                            },
                        )
                    });
                }
                let var = ctx.resolve_var(name.text()).ok_or_else(|| {
                    CompileError::semantic(
                        name.position,
                        SemanticError::UndefinedIdentifier {
                            name: name.text().to_string(),
                        },
                    )
                })?;
                ctx.emit(Instruction::new(Opcode::Lod, var.level, var.offset));
                Ok(var.ty)
            }
            TokenKind::Int32Literal | TokenKind::Float32Literal => {
                let literal = self.expect(token.kind)?;
                let value = literal_value(&literal)?;
                ctx.emit(Instruction::lit(value));
                Ok(value.scalar_type())
            }
            TokenKind::LParen => {
                self.expect(TokenKind::LParen)?;
                let ty = self.expression(ctx)?;
                self.expect(TokenKind::RParen)?;
                Ok(ty)
            }
            TokenKind::I32 | TokenKind::F32 => self.cast(ctx),
            _ => Err(self.unexpected(Expected::Factor)),
        }
    }

    /// `("i32" | "f32") "(" exp ")"`. Converts only when the operand's
    /// type differs from the target type.
    fn cast(&mut self, ctx: &mut Context) -> Result<ScalarType> {
        let target = self.scalar_type()?;
        self.expect(TokenKind::LParen)?;
        let found = self.expression(ctx)?;
        self.expect(TokenKind::RParen)?;
        match (found, target) {
            (ScalarType::F32, ScalarType::I32) => {
                ctx.emit(Instruction::opr(Operator::FToI));
            }
            (ScalarType::I32, ScalarType::F32) => {
                ctx.emit(Instruction::opr(Operator::IToF));
            }
            _ => {}
        }
        Ok(target)
    }

    /// Emit `left op right` through the dispatch table.
    fn binary(
        &mut self,
        ctx: &mut Context,
        op: &Token,
        left: ScalarType,
        right: ScalarType,
    ) -> Result<ScalarType> {
        let binary = BinaryOp::from_token(op.kind).ok_or_else(|| {
            CompileError::syntax(
                op.position,
                SyntaxError::Unexpected {
                    expected: Expected::Tokens(COMPARISONS.to_vec()),
                    found: op.to_string(),
                },
            )
        })?;
        let entry = lookup_binary(binary, left, right).ok_or_else(|| {
            CompileError::semantic(
                op.position,
                SemanticError::UnsupportedOperator {
                    op: binary.symbol(),
                    left,
                    right,
                },
            )
        })?;
        ctx.emit(Instruction::opr(entry.operator));
        Ok(entry.result)
    }
}
