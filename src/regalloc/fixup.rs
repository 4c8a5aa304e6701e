//! Operand rewriting and load/spill insertion.
//!
//! Once a range's symbols have registers, every operand occurrence of a
//! promoted symbol is substituted in place with a reference to the interned
//! register symbol. The range then needs fix-up `mov`s: a *load* initialises
//! a register from its symbol's memory at the range's entry, a *spill*
//! commits the register back at the range's exit.
//!
//! Loads and spills are staged in ordered maps keyed by the anchor's
//! *original* statement index and spliced into the block in a single rebuild
//! pass, which keeps every group in generation order and keeps anchors from
//! shifting under one another. Loads land before their anchor. Spills land
//! after theirs, unless the anchor transfers control (a branch or call), in
//! which case they land before it: whatever follows such a statement never
//! runs, and a callee must see memory already committed.

use super::{AllocRange, RangeAllocs};
use crate::ir::{
    symbol_table::SymbolTable,
    BasicBlock, Statement, SymbolRef,
};
use std::{collections::BTreeMap, mem};

/// Replace, within `range`, every operand whose symbol was assigned a
/// register with a reference to the corresponding register symbol. Operands
/// of untracked or unassigned symbols are left alone.
pub(crate) fn rewrite_range(block: &mut BasicBlock, range: AllocRange, allocs: &RangeAllocs) {
    let BasicBlock {
        statements,
        symbol_table,
    } = block;
    for stmt in &mut statements[range.first..=range.last] {
        stmt.for_each_operand_mut(&mut |sref, _| {
            if let Some(alloc) = allocs.get(&sref.sym()) {
                if let Some((reg_kind, reg_id)) = alloc.reg {
                    *sref = SymbolRef::new(symbol_table.make_symbol(reg_kind, reg_id, 0));
                }
            }
        });
    }
}

/// Generate the load and spill `mov`s for one range, staged against the
/// range's entry and exit statement indices. At most one load and one spill
/// is generated per promoted symbol.
pub(crate) fn collect(
    table: &mut SymbolTable,
    range: AllocRange,
    is_last_range: bool,
    allocs: &RangeAllocs,
    loads: &mut BTreeMap<usize, Vec<Statement>>,
    spills: &mut BTreeMap<usize, Vec<Statement>>,
) {
    for (&sidx, alloc) in allocs {
        let Some((reg_kind, reg_id)) = alloc.reg else {
            continue;
        };
        let reg = table.make_symbol(reg_kind, reg_id, 0);

        // A symbol read at or before its first write carries a value into
        // the range, so the register must be initialised from memory.
        if alloc.needs_load() {
            loads
                .entry(range.first)
                .or_default()
                .push(Statement::mov(SymbolRef::new(reg), SymbolRef::new(sidx)));
        }

        // A written symbol must be committed back at the range's end.
        // Exception: a temporary's value is dead once the block ends, so
        // spilling it from the final range would be wasted work.
        let dead_temporary = table.symbol(sidx).is_temporary() && is_last_range;
        if !dead_temporary && alloc.first_def.is_some() {
            spills
                .entry(range.last)
                .or_default()
                .push(Statement::mov(SymbolRef::new(sidx), SymbolRef::new(reg)));
        }
    }
}

/// Splice the staged loads and spills into `statements`, preserving the
/// relative order of original statements and, within each anchor, the order
/// in which the fix-ups were generated.
pub(crate) fn splice(
    statements: &mut Vec<Statement>,
    mut loads: BTreeMap<usize, Vec<Statement>>,
    mut spills: BTreeMap<usize, Vec<Statement>>,
) {
    if loads.is_empty() && spills.is_empty() {
        return;
    }

    let inserted =
        loads.values().map(Vec::len).sum::<usize>() + spills.values().map(Vec::len).sum::<usize>();
    let old = mem::take(statements);
    let mut new = Vec::with_capacity(old.len() + inserted);
    for (idx, stmt) in old.into_iter().enumerate() {
        if let Some(group) = loads.remove(&idx) {
            new.extend(group);
        }
        if stmt.op.transfers_control() {
            if let Some(group) = spills.remove(&idx) {
                new.extend(group);
            }
            new.push(stmt);
        } else {
            new.push(stmt);
            if let Some(group) = spills.remove(&idx) {
                new.extend(group);
            }
        }
    }
    debug_assert!(loads.is_empty() && spills.is_empty());
    *statements = new;
}
