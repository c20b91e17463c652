//! VM state management: value stack, registers, frame addressing, I/O.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::RuntimeError;
use pl0_common::{Instruction, Program};

/// Maximum number of stack cells.
pub const MAX_STACK_DEPTH: usize = 1 << 20;

/// Cells pushed by `CAL` below each frame's base: static link, return
/// address, saved base pointer (in push order).
pub const LINKAGE_CELLS: usize = 3;

/// Execution state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Executing, or not yet started.
    Running,
    /// The instruction pointer reached the end of the program.
    Halted,
    /// A runtime fault stopped execution. Terminal.
    Faulted,
}

/// The PL/0 stack machine.
///
/// One flat stack of 32-bit cells and two registers: the instruction
/// pointer `ip` and the base pointer `bp` of the active frame. Each cell
/// holds an `i32` or the bit pattern of an `f32`.
pub struct VM<'a, R, W> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    /// Value stack.
    pub(crate) stack: Vec<i32>,
    /// Index of the next instruction to fetch.
    pub(crate) ip: usize,
    /// Base of the active frame; its linkage cells sit just below.
    pub(crate) bp: usize,
    /// Index of the instruction being executed, for fault reports.
    pub(crate) at: usize,
    pub(crate) state: State,
    pub(crate) input: R,
    pub(crate) output: W,
    /// Input tokens already read from the current line.
    pub(crate) pending: VecDeque<String>,
}

impl<'a, R: BufRead, W: Write> VM<'a, R, W> {
    /// Create a new VM reading from `input` and writing to `output`.
    pub fn new(program: &'a Program, input: R, output: W) -> Self {
        Self {
            program,
            stack: Vec::with_capacity(1024),
            ip: 0,
            bp: 0,
            at: 0,
            state: State::Running,
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    /// Current execution state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The live value stack.
    pub fn stack(&self) -> &[i32] {
        &self.stack
    }

    /// Consume the VM, returning its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    pub(crate) fn reset(&mut self) {
        self.stack.clear();
        self.ip = 0;
        self.bp = 0;
        self.at = 0;
        self.state = State::Running;
        self.pending.clear();
    }

    /// Fetch the instruction at `ip`.
    pub(crate) fn fetch(&self) -> Result<Instruction, RuntimeError> {
        self.program
            .get(self.ip)
            .copied()
            .ok_or(RuntimeError::UnexpectedEndOfProgram { at: self.ip })
    }

    /// Convert a jump or call operand into an address. The program length
    /// itself is a valid target: it halts the machine.
    pub(crate) fn target(&self, target: i32) -> Result<usize, RuntimeError> {
        usize::try_from(target)
            .ok()
            .filter(|&t| t <= self.program.len())
            .ok_or(RuntimeError::InvalidTarget {
                at: self.at,
                target,
            })
    }

    /// Push a cell, checking for overflow.
    pub(crate) fn push(&mut self, cell: i32) -> Result<(), RuntimeError> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(RuntimeError::StackOverflow { at: self.at });
        }
        self.stack.push(cell);
        Ok(())
    }

    /// Pop a cell. Cells at or below the current base pointer belong to the
    /// frame's linkage or to the caller and can never be popped directly.
    pub(crate) fn pop(&mut self) -> Result<i32, RuntimeError> {
        if self.stack.len() <= self.bp {
            return Err(RuntimeError::StackUnderflow { at: self.at });
        }
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { at: self.at })
    }

    /// Grow or shrink the stack by `delta` cells. New cells are zero.
    pub(crate) fn grow(&mut self, delta: i32) -> Result<(), RuntimeError> {
        let target = self.stack.len() as i64 + delta as i64;
        if target < self.bp as i64 {
            return Err(RuntimeError::StackUnderflow { at: self.at });
        }
        if target > MAX_STACK_DEPTH as i64 {
            return Err(RuntimeError::StackOverflow { at: self.at });
        }
        self.stack.resize(target as usize, 0);
        Ok(())
    }

    /// Walk `level` static links outward from the current frame, returning
    /// the base of the frame reached.
    pub(crate) fn static_link(&self, level: i32) -> Result<usize, RuntimeError> {
        if level < 0 {
            return Err(RuntimeError::CorruptFrame { at: self.at });
        }
        let mut base = self.bp;
        for _ in 0..level {
            let link = base
                .checked_sub(LINKAGE_CELLS)
                .and_then(|slot| self.stack.get(slot))
                .ok_or(RuntimeError::StackUnderflow { at: self.at })?;
            base = usize::try_from(*link).map_err(|_| RuntimeError::CorruptFrame { at: self.at })?;
        }
        Ok(base)
    }

    /// Resolve `offset` within the frame `level` links out to a stack index.
    pub(crate) fn address(&self, level: i32, offset: i32) -> Result<usize, RuntimeError> {
        let base = self.static_link(level)?;
        let address = base as i64 + offset as i64;
        if address < 0 {
            return Err(RuntimeError::StackUnderflow { at: self.at });
        }
        if address >= self.stack.len() as i64 {
            return Err(RuntimeError::AddressOutOfRange {
                at: self.at,
                address,
                size: self.stack.len(),
            });
        }
        Ok(address as usize)
    }

    /// Next whitespace-delimited input token, reading a new line if needed.
    pub(crate) fn next_input_token(&mut self) -> Result<String, RuntimeError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            // Prompts written before a read must be visible while we block.
            self.output.flush().map_err(|e| self.io_error(e))?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| self.io_error(e))?;
            if read == 0 {
                return Err(RuntimeError::InputExhausted { at: self.at });
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
    }

    pub(crate) fn io_error(&self, err: std::io::Error) -> RuntimeError {
        RuntimeError::Io {
            at: self.at,
            message: err.to_string(),
        }
    }
}
