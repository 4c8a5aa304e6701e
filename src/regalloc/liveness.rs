//! Per-range liveness records.
//!
//! One forward walk over the range's statements populates a [SymRegAlloc]
//! for every symbol the statements touch: how often it occurs, where it is
//! first/last written and first/last read. Reads and writes are counted
//! independently, so a symbol used as both destination and source of one
//! statement contributes two occurrences.

use super::{AllocRange, RangeAllocs, SymRegAlloc};
use crate::ir::Statement;

pub(crate) fn compute(statements: &[Statement], range: AllocRange) -> RangeAllocs {
    let mut allocs = RangeAllocs::new();
    for idx in range.first..=range.last {
        let stmt = &statements[idx];

        stmt.for_each_def(&mut |sref, _| {
            let alloc: &mut SymRegAlloc = allocs.entry(sref.sym()).or_default();
            alloc.use_count += 1;
            if alloc.first_def.is_none() {
                alloc.first_def = Some(idx);
            }
            if alloc.last_def.map_or(true, |d| idx > d) {
                alloc.last_def = Some(idx);
            }
        });

        stmt.for_each_src(&mut |sref, _| {
            let alloc: &mut SymRegAlloc = allocs.entry(sref.sym()).or_default();
            alloc.use_count += 1;
            if alloc.first_use.is_none() {
                alloc.first_use = Some(idx);
            }
            if alloc.last_use.map_or(true, |u| idx > u) {
                alloc.last_use = Some(idx);
            }
        });
    }
    allocs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{symbol::SymKind, BasicBlock, Opcode, Statement, SymbolRef};

    #[test]
    fn first_and_last_positions() {
        let mut block = BasicBlock::new();
        let t = block.symbol_table.make_symbol(SymKind::Temporary, 0, 0);
        let rel = block.symbol_table.make_symbol(SymKind::Relative, 0x10, 0);
        // 0: mov t, rel
        // 1: add t, t, rel
        // 2: mov rel, t
        block.push(Statement::mov(SymbolRef::new(t), SymbolRef::new(rel)));
        block.push(Statement::binary(
            Opcode::Add,
            SymbolRef::new(t),
            SymbolRef::new(t),
            SymbolRef::new(rel),
        ));
        block.push(Statement::mov(SymbolRef::new(rel), SymbolRef::new(t)));

        let allocs = compute(&block.statements, AllocRange { first: 0, last: 2 });

        let ta = &allocs[&t];
        assert_eq!(ta.use_count, 4);
        assert_eq!(ta.first_def, Some(0));
        assert_eq!(ta.last_def, Some(1));
        assert_eq!(ta.first_use, Some(1));
        assert_eq!(ta.last_use, Some(2));

        let ra = &allocs[&rel];
        assert_eq!(ra.use_count, 3);
        assert_eq!(ra.first_def, Some(2));
        assert_eq!(ra.last_def, Some(2));
        assert_eq!(ra.first_use, Some(0));
        assert_eq!(ra.last_use, Some(1));
    }

    #[test]
    fn dst_and_src_in_one_statement_counts_twice() {
        let mut block = BasicBlock::new();
        let t = block.symbol_table.make_symbol(SymKind::Temporary, 0, 0);
        block.push(Statement::unary(Opcode::Not, SymbolRef::new(t), SymbolRef::new(t)));

        let allocs = compute(&block.statements, AllocRange { first: 0, last: 0 });
        let ta = &allocs[&t];
        assert_eq!(ta.use_count, 2);
        assert_eq!(ta.first_def, Some(0));
        assert_eq!(ta.first_use, Some(0));
    }

    #[test]
    fn only_statements_inside_the_range_are_observed() {
        let mut block = BasicBlock::new();
        let a = block.symbol_table.make_symbol(SymKind::Relative, 0x0, 0);
        let b = block.symbol_table.make_symbol(SymKind::Relative, 0x4, 0);
        block.push(Statement::mov(SymbolRef::new(a), SymbolRef::new(b)));
        block.push(Statement::new(Opcode::Call));
        block.push(Statement::mov(SymbolRef::new(b), SymbolRef::new(a)));

        let allocs = compute(&block.statements, AllocRange { first: 2, last: 2 });
        assert_eq!(allocs[&a].first_use, Some(2));
        assert_eq!(allocs[&a].first_def, None);
        assert_eq!(allocs[&b].first_def, Some(2));
        assert_eq!(allocs[&b].first_use, None);
    }

    #[test]
    fn load_condition() {
        // Read before written: must load.
        let read_first = SymRegAlloc {
            use_count: 2,
            first_use: Some(0),
            first_def: Some(1),
            ..Default::default()
        };
        assert!(read_first.needs_load());

        // Read but never written: must load.
        let read_only = SymRegAlloc {
            use_count: 1,
            first_use: Some(3),
            ..Default::default()
        };
        assert!(read_only.needs_load());

        // Written before read: the register is defined in place.
        let def_first = SymRegAlloc {
            use_count: 2,
            first_def: Some(0),
            first_use: Some(1),
            ..Default::default()
        };
        assert!(!def_first.needs_load());

        // Written, never read.
        let def_only = SymRegAlloc {
            use_count: 1,
            first_def: Some(0),
            ..Default::default()
        };
        assert!(!def_only.needs_load());
    }
}
