//! Greedy register assignment.
//!
//! Candidates are the tracked symbols of an allocatable kind that were not
//! flagged by [aliasing](super::aliasing). They are ranked by heat and
//! handed registers until the matching pool runs dry; the rest stay in
//! memory, which is not an error.
//!
//! The ranking is total and deterministic so that recompiling the same block
//! always produces the same code: higher use count first, ties broken by
//! higher kind, then by higher `value_low`.
//!
//! The pools are typed. Plain and reference symbols draw from the general
//! purpose pool; float and 128-bit symbols draw from the vector ("MD") pool,
//! which backs both float and vector operations on all of our target
//! platforms. Ids are popped from the tail of each pool.

use super::RangeAllocs;
use crate::{
    codegen::CodeGen,
    ir::{symbol::SymKind, symbol_table::SymbolTable},
};

pub(crate) fn run(table: &SymbolTable, cg: &dyn CodeGen, allocs: &mut RangeAllocs) {
    let mut gp_pool: Vec<u32> = (0..cg.available_register_count()).collect();
    let mut md_pool: Vec<u32> = (0..cg.available_md_register_count()).collect();

    let mut candidates: Vec<_> = allocs
        .iter()
        .filter(|(&sidx, alloc)| table.symbol(sidx).kind().is_allocatable() && !alloc.aliased)
        .map(|(&sidx, _)| sidx)
        .collect();

    candidates.sort_by(|&a, &b| {
        let (sym_a, sym_b) = (table.symbol(a), table.symbol(b));
        allocs[&b]
            .use_count
            .cmp(&allocs[&a].use_count)
            .then_with(|| sym_b.kind().cmp(&sym_a.kind()))
            .then_with(|| sym_b.value_low().cmp(&sym_a.value_low()))
    });

    for sidx in candidates {
        let (pool, reg_kind) = match table.symbol(sidx).kind() {
            SymKind::Relative | SymKind::Temporary => (&mut gp_pool, SymKind::Register),
            SymKind::RelReference | SymKind::TmpReference => (&mut gp_pool, SymKind::RegReference),
            SymKind::FpRelative32 | SymKind::FpTemporary32 => {
                (&mut md_pool, SymKind::FpRegister32)
            }
            SymKind::Relative128 | SymKind::Temporary128 => (&mut md_pool, SymKind::Register128),
            // Candidates are filtered to allocatable kinds above.
            _ => unreachable!(),
        };
        if let Some(id) = pool.pop() {
            // The key came out of `allocs` moments ago.
            allocs.get_mut(&sidx).unwrap().reg = Some((reg_kind, id));
        }
    }
}
