//! Main execution loop and opcode dispatch for the PL/0 VM.

use std::io::{BufRead, Write};

use crate::error::RuntimeError;
use crate::machine::{State, LINKAGE_CELLS, VM};
use pl0_common::{Instruction, Opcode, Operator, ScalarType, Value};

impl<'a, R: BufRead, W: Write> VM<'a, R, W> {
    /// Execute the program from address 0 until the instruction pointer
    /// reaches the end of the program, or a fault occurs.
    ///
    /// The stack and registers are reset first, so a VM can be run again.
    pub fn execute(&mut self) -> Result<(), RuntimeError> {
        self.reset();
        let mut result = self.run_loop();
        if let Err(e) = self.output.flush() {
            result = result.and(Err(self.io_error(e)));
        }
        self.state = match result {
            Ok(()) => State::Halted,
            Err(_) => State::Faulted,
        };
        result
    }

    fn run_loop(&mut self) -> Result<(), RuntimeError> {
        while self.ip != self.program.len() {
            let instr = self.fetch()?;
            self.at = self.ip;
            self.ip += 1;

            match instr.opcode {
                Opcode::Lit => self.push(instr.arg)?,
                Opcode::Opr => self.exec_opr(&instr)?,
                Opcode::Lod => {
                    let address = self.address(instr.level, instr.arg)?;
                    self.push(self.stack[address])?;
                }
                Opcode::Sto => {
                    let cell = self.pop()?;
                    let address = self.address(instr.level, instr.arg)?;
                    self.stack[address] = cell;
                }
                Opcode::Cal => self.exec_call(&instr)?,
                Opcode::Int => self.grow(instr.arg)?,
                Opcode::Jmp => self.ip = self.target(instr.arg)?,
                Opcode::Jpc => {
                    let cond = self.pop()?;
                    if cond == 0 {
                        self.ip = self.target(instr.arg)?;
                    }
                }
                Opcode::Red => self.exec_read(&instr, ScalarType::I32)?,
                Opcode::Fred => self.exec_read(&instr, ScalarType::F32)?,
                Opcode::Wrt => self.exec_write(ScalarType::I32)?,
                Opcode::Fwrt => self.exec_write(ScalarType::F32)?,
            }
        }
        Ok(())
    }

    // ---- Calls ----

    fn exec_call(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.target(instr.arg)?;
        let link = self.static_link(instr.level)?;
        self.push(link as i32)?;
        self.push(self.ip as i32)?;
        self.push(self.bp as i32)?;
        self.bp = self.stack.len();
        self.ip = target;
        Ok(())
    }

    fn exec_ret(&mut self) -> Result<(), RuntimeError> {
        if self.bp < LINKAGE_CELLS {
            return Err(RuntimeError::StackUnderflow { at: self.at });
        }
        if self.stack.len() != self.bp {
            return Err(RuntimeError::CorruptFrame { at: self.at });
        }
        let saved_bp = self.stack[self.bp - 1];
        let return_address = self.stack[self.bp - 2];
        let corrupt = RuntimeError::CorruptFrame { at: self.at };
        let saved_bp = usize::try_from(saved_bp).map_err(|_| corrupt.clone())?;
        let return_address = usize::try_from(return_address).map_err(|_| corrupt.clone())?;
        if saved_bp > self.bp - LINKAGE_CELLS {
            return Err(corrupt);
        }

        self.stack.truncate(self.bp - LINKAGE_CELLS);
        self.bp = saved_bp;
        self.ip = return_address;
        Ok(())
    }

    // ---- I/O ----

    fn exec_read(&mut self, instr: &Instruction, ty: ScalarType) -> Result<(), RuntimeError> {
        let address = self.address(instr.level, instr.arg)?;
        let token = self.next_input_token()?;
        let value = match ty {
            ScalarType::I32 => token.parse::<i32>().ok().map(Value::I32),
            ScalarType::F32 => token.parse::<f32>().ok().map(Value::F32),
        };
        let value = value.ok_or(RuntimeError::InvalidInput { at: self.at, token })?;
        self.stack[address] = value.to_cell();
        Ok(())
    }

    fn exec_write(&mut self, ty: ScalarType) -> Result<(), RuntimeError> {
        let value = Value::from_cell(self.pop()?, ty);
        writeln!(self.output, "{value}").map_err(|e| self.io_error(e))
    }

    // ---- OPR ----

    fn exec_opr(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let op = Operator::try_from(instr.arg).map_err(|_| RuntimeError::UnknownOperator {
            at: self.at,
            code: instr.arg,
        })?;

        match op {
            Operator::Ret => self.exec_ret(),

            Operator::Neg => self.exec_unary(|a| a.wrapping_neg()),
            Operator::Odd => self.exec_unary(|a| ((a & 1) != 0) as i32),
            Operator::Add => self.exec_int_binary(|a, b| a.wrapping_add(b)),
            Operator::Sub => self.exec_int_binary(|a, b| a.wrapping_sub(b)),
            Operator::Mul => self.exec_int_binary(|a, b| a.wrapping_mul(b)),
            Operator::Div => self.exec_int_div(),
            Operator::Eql => self.exec_int_compare(|a, b| a == b),
            Operator::Neq => self.exec_int_compare(|a, b| a != b),
            Operator::Lss => self.exec_int_compare(|a, b| a < b),
            Operator::Leq => self.exec_int_compare(|a, b| a <= b),
            Operator::Gtr => self.exec_int_compare(|a, b| a > b),
            Operator::Geq => self.exec_int_compare(|a, b| a >= b),

            Operator::FNeg => self.exec_unary(|a| float_cell(-cell_float(a))),
            Operator::FAdd => self.exec_float_binary(|a, b| a + b),
            Operator::FSub => self.exec_float_binary(|a, b| a - b),
            Operator::FMul => self.exec_float_binary(|a, b| a * b),
            Operator::FDiv => self.exec_float_div(),
            Operator::FEql => self.exec_float_compare(|a, b| a == b),
            Operator::FNeq => self.exec_float_compare(|a, b| a != b),
            Operator::FLss => self.exec_float_compare(|a, b| a < b),
            Operator::FLeq => self.exec_float_compare(|a, b| a <= b),
            Operator::FGtr => self.exec_float_compare(|a, b| a > b),
            Operator::FGeq => self.exec_float_compare(|a, b| a >= b),

            Operator::IToF => self.exec_unary(|a| float_cell(a as f32)),
            Operator::FToI => self.exec_unary(|a| cell_float(a) as i32),
        }
    }

    /// Replace the top cell with `op(top)`.
    fn exec_unary(&mut self, op: fn(i32) -> i32) -> Result<(), RuntimeError> {
        let a = self.pop()?;
        self.push(op(a))
    }

    /// Pop `b`, pop `a`, push `op(a, b)`.
    fn exec_int_binary(&mut self, op: fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(op(a, b))
    }

    fn exec_int_compare(&mut self, op: fn(i32, i32) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(op(a, b) as i32)
    }

    fn exec_int_div(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        if b == 0 {
            return Err(RuntimeError::DivisionByZero { at: self.at });
        }
        // Rust's `/` truncates toward zero; only `MIN / -1` needs wrapping.
        self.push(a.wrapping_div(b))
    }

    fn exec_float_binary(&mut self, op: fn(f32, f32) -> f32) -> Result<(), RuntimeError> {
        let b = cell_float(self.pop()?);
        let a = cell_float(self.pop()?);
        self.push(float_cell(op(a, b)))
    }

    fn exec_float_compare(&mut self, op: fn(f32, f32) -> bool) -> Result<(), RuntimeError> {
        let b = cell_float(self.pop()?);
        let a = cell_float(self.pop()?);
        self.push(op(a, b) as i32)
    }

    fn exec_float_div(&mut self) -> Result<(), RuntimeError> {
        let b = cell_float(self.pop()?);
        let a = cell_float(self.pop()?);
        if b == 0.0 {
            return Err(RuntimeError::DivisionByZero { at: self.at });
        }
        self.push(float_cell(a / b))
    }
}

fn cell_float(cell: i32) -> f32 {
    f32::from_bits(cell as u32)
}

fn float_cell(value: f32) -> i32 {
    value.to_bits() as i32
}
