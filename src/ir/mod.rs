//! The three-address intermediate representation.
//!
//! A [BasicBlock] is a straight-line [Statement] sequence plus the
//! [SymbolTable](symbol_table::SymbolTable) that owns every symbol the
//! statements reference. Each statement has an opcode, an optional
//! destination and up to two sources; operand slots hold [SymbolRef]s so
//! that a pass can substitute an operand in place without disturbing the
//! statement's shape.
//!
//! Statements expose two operand traversals: a read-only one for analyses
//! and a mutable one for rewriting. Both visit the destination first, then
//! the sources in order, and tell the callback whether the slot it is
//! looking at is writable (the destination) or read-only (a source).

pub mod symbol;
pub mod symbol_table;
#[cfg(any(debug_assertions, test))]
mod well_formed;

use std::fmt;
use symbol_table::{SymIdx, SymbolTable};

/// An IR opcode.
///
/// The set is closed; any opcode that is not a call, a control transfer or
/// `ParamRet` is treated by the allocator as a plain computation whose
/// operands are scanned generically.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Opcode {
    Nop,
    Mov,
    Add,
    Sub,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Srl,
    Sra,
    Cmp,
    Jmp,
    CondJmp,
    Call,
    ExternJmp,
    ExternJmpDyn,
    Param,
    ParamRet,
    RetVal,
}

impl Opcode {
    /// Does this opcode call back into the runtime? Calls end an allocation
    /// range, because the callee may observe or mutate any context slot.
    pub fn is_call(self) -> bool {
        matches!(self, Self::Call)
    }

    /// Does control leave the statement sequence at this opcode? Anything
    /// inserted "after" such a statement would never execute, so spills at a
    /// range's end must be placed before it.
    pub fn transfers_control(self) -> bool {
        matches!(
            self,
            Self::CondJmp | Self::Jmp | Self::Call | Self::ExternJmp | Self::ExternJmpDyn
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Nop => "nop",
            Self::Mov => "mov",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Not => "not",
            Self::Shl => "shl",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Cmp => "cmp",
            Self::Jmp => "jmp",
            Self::CondJmp => "cond_jmp",
            Self::Call => "call",
            Self::ExternJmp => "extern_jmp",
            Self::ExternJmpDyn => "extern_jmp_dyn",
            Self::Param => "param",
            Self::ParamRet => "param_ret",
            Self::RetVal => "ret_val",
        };
        write!(f, "{s}")
    }
}

/// A versioned reference to an interned symbol.
///
/// The version tags SSA-style renamings made by other passes; the allocator
/// only ever fabricates unversioned references. Equality compares both the
/// handle and the version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolRef {
    sym: SymIdx,
    version: Option<u32>,
}

impl SymbolRef {
    /// Create an unversioned reference to `sym`.
    pub fn new(sym: SymIdx) -> Self {
        Self { sym, version: None }
    }

    /// Create a reference to `sym` at `version`.
    pub fn versioned(sym: SymIdx, version: u32) -> Self {
        Self {
            sym,
            version: Some(version),
        }
    }

    pub fn sym(self) -> SymIdx {
        self.sym
    }

    pub fn version(self) -> Option<u32> {
        self.version
    }

    pub fn is_versioned(self) -> bool {
        self.version.is_some()
    }

    pub fn display(self, table: &SymbolTable) -> DisplayableSymbolRef<'_> {
        DisplayableSymbolRef { sref: self, table }
    }
}

pub struct DisplayableSymbolRef<'a> {
    sref: SymbolRef,
    table: &'a SymbolTable,
}

impl fmt::Display for DisplayableSymbolRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table.symbol(self.sref.sym))?;
        if let Some(v) = self.sref.version {
            write!(f, "@{v}")?;
        }
        Ok(())
    }
}

/// A three-address statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Statement {
    pub op: Opcode,
    pub dst: Option<SymbolRef>,
    pub src1: Option<SymbolRef>,
    pub src2: Option<SymbolRef>,
}

impl Statement {
    /// A statement with no operands.
    pub fn new(op: Opcode) -> Self {
        Self {
            op,
            dst: None,
            src1: None,
            src2: None,
        }
    }

    pub fn mov(dst: SymbolRef, src1: SymbolRef) -> Self {
        Self {
            op: Opcode::Mov,
            dst: Some(dst),
            src1: Some(src1),
            src2: None,
        }
    }

    pub fn unary(op: Opcode, dst: SymbolRef, src1: SymbolRef) -> Self {
        Self {
            op,
            dst: Some(dst),
            src1: Some(src1),
            src2: None,
        }
    }

    pub fn binary(op: Opcode, dst: SymbolRef, src1: SymbolRef, src2: SymbolRef) -> Self {
        Self {
            op,
            dst: Some(dst),
            src1: Some(src1),
            src2: Some(src2),
        }
    }

    /// Apply `f` to the destination operand, if present. The `bool` handed
    /// to `f` is `true`: the destination is a writable slot.
    pub fn for_each_def<F>(&self, f: &mut F)
    where
        F: FnMut(SymbolRef, bool),
    {
        if let Some(sref) = self.dst {
            f(sref, true);
        }
    }

    /// Apply `f` to each source operand in order. The `bool` handed to `f`
    /// is `false`: sources are read-only slots.
    pub fn for_each_src<F>(&self, f: &mut F)
    where
        F: FnMut(SymbolRef, bool),
    {
        if let Some(sref) = self.src1 {
            f(sref, false);
        }
        if let Some(sref) = self.src2 {
            f(sref, false);
        }
    }

    /// Apply `f` to every operand: destination first, then sources.
    pub fn for_each_operand<F>(&self, f: &mut F)
    where
        F: FnMut(SymbolRef, bool),
    {
        self.for_each_def(f);
        self.for_each_src(f);
    }

    /// Apply `f` to a mutable reference to every operand slot, destination
    /// first. This is the rewriting traversal: `f` may replace the
    /// [SymbolRef] in place.
    pub fn for_each_operand_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut SymbolRef, bool),
    {
        if let Some(sref) = &mut self.dst {
            f(sref, true);
        }
        if let Some(sref) = &mut self.src1 {
            f(sref, false);
        }
        if let Some(sref) = &mut self.src2 {
            f(sref, false);
        }
    }

    pub fn display<'a>(&'a self, table: &'a SymbolTable) -> DisplayableStatement<'a> {
        DisplayableStatement { stmt: self, table }
    }
}

pub struct DisplayableStatement<'a> {
    stmt: &'a Statement,
    table: &'a SymbolTable,
}

impl fmt::Display for DisplayableStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stmt.op)?;
        let mut first = true;
        for sref in [self.stmt.dst, self.stmt.src1, self.stmt.src2]
            .into_iter()
            .flatten()
        {
            if first {
                write!(f, " {}", sref.display(self.table))?;
                first = false;
            } else {
                write!(f, ", {}", sref.display(self.table))?;
            }
        }
        Ok(())
    }
}

/// A straight-line statement sequence with a single entry and a single exit,
/// plus the table owning every symbol the statements reference.
#[derive(Debug, Default)]
pub struct BasicBlock {
    pub statements: Vec<Statement>,
    pub symbol_table: SymbolTable,
}

impl BasicBlock {
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
            symbol_table: SymbolTable::new(),
        }
    }

    pub fn push(&mut self, stmt: Statement) {
        self.statements.push(stmt);
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{}", stmt.display(&self.symbol_table))?;
        }
        Ok(())
    }
}
