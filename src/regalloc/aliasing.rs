//! Aliased symbol marking.
//!
//! A symbol whose storage overlaps storage touched by any statement in the
//! range cannot be kept in a register across that statement: the memory
//! access and the register copy would disagree. Such symbols are flagged
//! `aliased` and skipped by assignment; they stay memory-resident.
//!
//! Two situations flag a symbol:
//!
//!  * the range contains a `param_ret` statement naming it: the callee will
//!    write its return value through that symbol's storage;
//!  * some statement in the range references a *different* symbol whose
//!    storage overlaps it (see [Symbol::aliases](crate::ir::symbol::Symbol::aliases)).
//!
//! Because symbols are interned, handle equality is structural equality, so
//! "different symbol" is a plain handle comparison.

use super::{AllocRange, RangeAllocs};
use crate::ir::{symbol_table::SymbolTable, Opcode, Statement};
use smallvec::SmallVec;

pub(crate) fn mark(
    statements: &[Statement],
    table: &SymbolTable,
    range: AllocRange,
    allocs: &mut RangeAllocs,
) {
    for idx in range.first..=range.last {
        let stmt = &statements[idx];

        if stmt.op == Opcode::ParamRet {
            if let Some(sref) = stmt.src1 {
                allocs.entry(sref.sym()).or_default().aliased = true;
            }
        }

        let mut referenced: SmallVec<[_; 3]> = SmallVec::new();
        stmt.for_each_operand(&mut |sref, _| referenced.push(sref.sym()));

        for (&tracked, alloc) in allocs.iter_mut() {
            if alloc.aliased {
                continue;
            }
            let tracked_sym = table.symbol(tracked);
            for &sidx in &referenced {
                if sidx == tracked {
                    continue;
                }
                if table.symbol(sidx).aliases(tracked_sym) {
                    alloc.aliased = true;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codegen::FixedCodeGen,
        ir::{symbol::SymKind, BasicBlock, SymbolRef},
        regalloc::{allocate_registers, liveness},
    };

    #[test]
    fn overlapping_relatives_are_marked() {
        let mut block = BasicBlock::new();
        let rel_x = block.symbol_table.make_symbol(SymKind::Relative, 0, 0);
        let rel128_y = block.symbol_table.make_symbol(SymKind::Relative128, 0, 0);
        let t = block.symbol_table.make_symbol(SymKind::Temporary, 0, 0);
        block.push(Statement::mov(SymbolRef::new(t), SymbolRef::new(rel_x)));
        block.push(Statement::mov(SymbolRef::new(rel128_y), SymbolRef::new(rel128_y)));

        let range = AllocRange { first: 0, last: 1 };
        let mut allocs = liveness::compute(&block.statements, range);
        mark(&block.statements, &block.symbol_table, range, &mut allocs);

        assert!(allocs[&rel_x].aliased);
        assert!(allocs[&rel128_y].aliased);
        assert!(!allocs[&t].aliased);
    }

    #[test]
    fn disjoint_relatives_are_not_marked() {
        let mut block = BasicBlock::new();
        let a = block.symbol_table.make_symbol(SymKind::Relative, 0x0, 0);
        let b = block.symbol_table.make_symbol(SymKind::Relative, 0x4, 0);
        block.push(Statement::mov(SymbolRef::new(a), SymbolRef::new(b)));

        let range = AllocRange { first: 0, last: 0 };
        let mut allocs = liveness::compute(&block.statements, range);
        mark(&block.statements, &block.symbol_table, range, &mut allocs);

        assert!(!allocs[&a].aliased);
        assert!(!allocs[&b].aliased);
    }

    #[test]
    fn param_ret_source_is_marked() {
        let mut block = BasicBlock::new();
        let t = block.symbol_table.make_symbol(SymKind::Temporary, 0, 0);
        block.push(Statement {
            src1: Some(SymbolRef::new(t)),
            ..Statement::new(Opcode::ParamRet)
        });

        let range = AllocRange { first: 0, last: 0 };
        let mut allocs = liveness::compute(&block.statements, range);
        mark(&block.statements, &block.symbol_table, range, &mut allocs);

        assert!(allocs[&t].aliased);
    }

    // An aliased symbol is never assigned a register, even when the pool has
    // room for it.
    #[test]
    fn aliased_symbols_are_never_promoted() {
        let mut block = BasicBlock::new();
        let rel_x = block.symbol_table.make_symbol(SymKind::Relative, 0, 0);
        let rel128_y = block.symbol_table.make_symbol(SymKind::Relative128, 0, 0);
        let t = block.symbol_table.make_symbol(SymKind::Temporary, 0, 0);
        block.push(Statement::mov(SymbolRef::new(t), SymbolRef::new(rel_x)));
        block.push(Statement::mov(SymbolRef::new(rel128_y), SymbolRef::new(rel128_y)));

        allocate_registers(&mut block, &FixedCodeGen { gp: 4, md: 4 });

        // Only the temporary was promoted: rel_x keeps its memory form and
        // is loaded into the temporary's register directly.
        assert_eq!(
            block.to_string(),
            "mov r3, rel(0x0)\n\
             mov rel128(0x0), rel128(0x0)\n"
        );
    }

    #[test]
    fn marking_is_scoped_to_the_range() {
        let mut block = BasicBlock::new();
        let rel_x = block.symbol_table.make_symbol(SymKind::Relative, 0, 0);
        let rel128_y = block.symbol_table.make_symbol(SymKind::Relative128, 0, 0);
        // The overlapping reference sits in a different range.
        block.push(Statement::mov(SymbolRef::new(rel_x), SymbolRef::new(rel_x)));
        block.push(Statement::new(Opcode::Call));
        block.push(Statement::mov(SymbolRef::new(rel128_y), SymbolRef::new(rel128_y)));

        let range = AllocRange { first: 0, last: 1 };
        let mut allocs = liveness::compute(&block.statements, range);
        mark(&block.statements, &block.symbol_table, range, &mut allocs);
        assert!(!allocs[&rel_x].aliased);
    }
}
