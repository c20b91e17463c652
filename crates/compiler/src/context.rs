//! Compilation state threaded through every parser production: the scope
//! tree, the path of procedures currently being compiled, and the
//! instruction vector under construction.

use pl0_common::{Instruction, Opcode, Operator, Program, ScalarType, Value};

use crate::error::SemanticError;
use crate::scope::{Attribute, ProcedureInfo, ScopeId, ScopeTree};

/// A variable, parameter, or constant resolved from the current scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarRef {
    /// Number of static links to follow from the current frame.
    pub level: i32,
    pub offset: i32,
    pub ty: ScalarType,
    pub attribute: Attribute,
}

/// A procedure resolved from the current scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTarget {
    pub level: i32,
    pub entry: usize,
    pub name: String,
    pub params: Vec<ScalarType>,
    pub ret: Option<ScalarType>,
}

#[derive(Debug, Clone)]
pub struct Context {
    pub scopes: ScopeTree,
    /// Procedures being compiled, outermost first. Never empty: the main
    /// program is always at the bottom.
    path: Vec<ScopeId>,
    pub code: Vec<Instruction>,
    /// Jumps emitted by `return;` in the main program, patched to the end
    /// of the program once it is known.
    exits: Vec<usize>,
}

impl Context {
    pub fn new(program_name: &str) -> Self {
        Self {
            scopes: ScopeTree::new(program_name),
            path: vec![ScopeTree::ROOT],
            code: Vec::new(),
            exits: Vec::new(),
        }
    }

    pub fn current(&self) -> ScopeId {
        self.path.last().copied().unwrap_or(ScopeTree::ROOT)
    }

    pub fn current_scope(&self) -> &ProcedureInfo {
        self.scopes.get(self.current())
    }

    pub fn is_main(&self) -> bool {
        self.path.len() == 1
    }

    /// Nesting depth of the procedure being compiled; 0 for the main program.
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn enter(&mut self, id: ScopeId) {
        self.path.push(id);
    }

    pub fn leave(&mut self) {
        if self.path.len() > 1 {
            self.path.pop();
        }
    }

    /// Declare a constant or variable in the current scope.
    pub fn declare(
        &mut self,
        attribute: Attribute,
        ty: ScalarType,
        name: &str,
        value: Option<Value>,
    ) -> Result<(), SemanticError> {
        let id = self.current();
        self.scopes.get_mut(id).declare(attribute, ty, name, value)
    }

    /// Declare a procedure nested in the current scope. Its entry is the
    /// next instruction to be emitted. The name may not repeat the
    /// enclosing procedure's or a sibling's.
    pub fn declare_procedure(
        &mut self,
        name: &str,
        params: Vec<(String, ScalarType)>,
        ret: Option<ScalarType>,
    ) -> Result<ScopeId, SemanticError> {
        if self.current_scope().name == name {
            return Err(SemanticError::DuplicateProcedure {
                name: name.to_string(),
            });
        }
        let info = ProcedureInfo::new(name.to_string(), self.code.len(), params, ret);
        self.scopes.add_child(self.current(), info)
    }

    /// Resolve a name, innermost scope first. The level is the number of
    /// scopes skipped.
    pub fn resolve_var(&self, name: &str) -> Option<VarRef> {
        self.path
            .iter()
            .rev()
            .enumerate()
            .find_map(|(level, &id)| {
                self.scopes.get(id).lookup(name).map(|v| VarRef {
                    level: level as i32,
                    offset: v.offset,
                    ty: v.ty,
                    attribute: v.attribute,
                })
            })
    }

    /// Resolve a procedure among the children of each enclosing scope,
    /// innermost first. A procedure calling itself is found among its
    /// parent's children, one level out.
    pub fn resolve_procedure(&self, name: &str) -> Option<CallTarget> {
        self.path
            .iter()
            .rev()
            .enumerate()
            .find_map(|(level, &id)| {
                self.scopes.child_named(id, name).map(|child| {
                    let info = self.scopes.get(child);
                    CallTarget {
                        level: level as i32,
                        entry: info.entry,
                        name: info.name.clone(),
                        params: info.param_types(),
                        ret: info.ret.as_ref().map(|r| r.ty),
                    }
                })
            })
    }

    // ---- Emission ----

    /// Append an instruction, returning its index.
    pub fn emit(&mut self, instr: Instruction) -> usize {
        self.code.push(instr);
        self.code.len() - 1
    }

    /// Index of the next instruction to be emitted.
    pub fn here(&self) -> i32 {
        self.code.len() as i32
    }

    /// Point the jump at `index` to the next instruction to be emitted.
    pub fn patch_here(&mut self, index: usize) {
        let target = self.here();
        self.code[index].arg = target;
    }

    /// Reserve the current frame's locals and store its constants.
    pub fn emit_frame_setup(&mut self) {
        let scope = self.current_scope();
        let size = scope.frame_size();
        let constants: Vec<_> = scope.constants().collect();
        if size > 0 {
            self.emit(Instruction::int(size));
        }
        for (offset, value) in constants {
            self.emit(Instruction::lit(value));
            self.emit(Instruction::new(Opcode::Sto, 0, offset));
        }
    }

    /// Release the current frame's locals.
    pub fn emit_frame_release(&mut self) {
        let size = self.current_scope().frame_size();
        if size > 0 {
            self.emit(Instruction::int(-size));
        }
    }

    /// Leave the current procedure. In the main program this jumps to the
    /// end of the program, halting the machine.
    pub fn emit_exit(&mut self) {
        if self.is_main() {
            let index = self.emit(Instruction::jmp(0));
            self.exits.push(index);
        } else {
            self.emit(Instruction::opr(Operator::Ret));
        }
    }

    /// Patch the main program's exits and hand back the finished program.
    pub fn finish(mut self) -> Program {
        let end = self.here();
        for index in std::mem::take(&mut self.exits) {
            self.code[index].arg = end;
        }
        Program::new(self.code)
    }
}
