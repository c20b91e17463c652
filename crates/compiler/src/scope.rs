//! Symbol tables: one [`ProcedureInfo`] per procedure, the main program
//! included, held in an arena and linked by index.
//!
//! Offsets are relative to the frame's base pointer. Parameters sit below
//! the linkage cells at negative offsets, the return slot below them, and
//! locals from offset 0 up in declaration order.

use pl0_common::{ScalarType, Value};

use crate::error::SemanticError;

/// Index of a procedure in a [`ScopeTree`].
pub type ScopeId = usize;

/// Linkage cells between a frame's arguments and its base pointer.
const LINKAGE_CELLS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Const,
    Var,
}

/// A named storage slot: local, parameter, or return slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInfo {
    pub attribute: Attribute,
    pub ty: ScalarType,
    pub name: String,
    pub offset: i32,
    /// Initial value; present only for constants.
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureInfo {
    /// Address of the first instruction of the procedure's block.
    pub entry: usize,
    pub name: String,
    pub params: Vec<VarInfo>,
    pub ret: Option<VarInfo>,
    pub locals: Vec<VarInfo>,
    pub children: Vec<ScopeId>,
    pub parent: Option<ScopeId>,
}

impl ProcedureInfo {
    /// A procedure with the given signature. Parameter `i` of `n` gets
    /// offset `i - n - 3`; the return slot, if any, sits just below the
    /// first parameter.
    pub fn new(
        name: String,
        entry: usize,
        params: Vec<(String, ScalarType)>,
        ret: Option<ScalarType>,
    ) -> Self {
        let n = params.len() as i32;
        let params = params
            .into_iter()
            .enumerate()
            .map(|(i, (name, ty))| VarInfo {
                attribute: Attribute::Var,
                ty,
                name,
                offset: i as i32 - n - LINKAGE_CELLS,
                value: None,
            })
            .collect();
        let ret = ret.map(|ty| VarInfo {
            attribute: Attribute::Var,
            ty,
            name: name.clone(),
            offset: -n - LINKAGE_CELLS - 1,
            value: None,
        });
        Self {
            entry,
            name,
            params,
            ret,
            locals: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Look up a local or parameter. Locals shadow parameters.
    pub fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.locals
            .iter()
            .chain(self.params.iter())
            .find(|v| v.name == name)
    }

    /// Declare a constant or variable in the next free local slot.
    pub fn declare(
        &mut self,
        attribute: Attribute,
        ty: ScalarType,
        name: &str,
        value: Option<Value>,
    ) -> Result<(), SemanticError> {
        if self.lookup(name).is_some() {
            return Err(SemanticError::DuplicateDefinition {
                name: name.to_string(),
            });
        }
        self.locals.push(VarInfo {
            attribute,
            ty,
            name: name.to_string(),
            offset: self.locals.len() as i32,
            value,
        });
        Ok(())
    }

    /// Number of local cells the frame reserves.
    pub fn frame_size(&self) -> i32 {
        self.locals.len() as i32
    }

    /// `(offset, value)` of every constant, in declaration order.
    pub fn constants(&self) -> impl Iterator<Item = (i32, Value)> + '_ {
        self.locals
            .iter()
            .filter_map(|v| v.value.map(|value| (v.offset, value)))
    }

    pub fn param_types(&self) -> Vec<ScalarType> {
        self.params.iter().map(|p| p.ty).collect()
    }
}

/// Arena of all procedures of one program. Index 0 is the main program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTree {
    procedures: Vec<ProcedureInfo>,
}

impl ScopeTree {
    /// The index of the main program.
    pub const ROOT: ScopeId = 0;

    pub fn new(program_name: &str) -> Self {
        Self {
            procedures: vec![ProcedureInfo::new(
                program_name.to_string(),
                0,
                Vec::new(),
                None,
            )],
        }
    }

    pub fn get(&self, id: ScopeId) -> &ProcedureInfo {
        &self.procedures[id]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut ProcedureInfo {
        &mut self.procedures[id]
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Add `info` as a child of `parent`, rejecting a name already used by
    /// a sibling.
    pub fn add_child(
        &mut self,
        parent: ScopeId,
        mut info: ProcedureInfo,
    ) -> Result<ScopeId, SemanticError> {
        if self.child_named(parent, &info.name).is_some() {
            return Err(SemanticError::DuplicateProcedure { name: info.name });
        }
        let id = self.procedures.len();
        info.parent = Some(parent);
        self.procedures.push(info);
        self.procedures[parent].children.push(id);
        Ok(id)
    }

    pub fn child_named(&self, parent: ScopeId, name: &str) -> Option<ScopeId> {
        self.procedures[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.procedures[child].name == name)
    }
}
