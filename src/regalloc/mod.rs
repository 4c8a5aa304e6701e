//! Intra-block register allocation.
//!
//! Allocation is done per *range*. A range is a maximal run of statements
//! that ends either with a call or with the block's end. We allocate per
//! range because a callee may observe or mutate any context slot: every
//! register-resident copy of a memory-backed symbol has to be spilled back
//! before control reaches the call, and reloaded afterwards.
//!
//! A downside is that temporaries get the same treatment and are spilled at
//! a range's end even though a temporary can stay live across a call; only
//! the block's final range gets to discard dead temporaries.
//!
//! For each range the pipeline is:
//!
//!  1. [liveness]: record per-symbol use counts and first/last use/def
//!     positions.
//!  2. [aliasing]: disqualify symbols whose storage overlaps other
//!     referenced storage (such symbols must stay memory-resident).
//!  3. [assign]: greedily hand out registers from the backend's typed pools,
//!     hottest symbol first.
//!  4. [fixup]: substitute operand references with register symbols, then
//!     synthesize the `mov`s that load registers at the range's entry and
//!     spill them at its exit.
//!
//! All loads and spills are staged against *original* statement indices and
//! spliced into the block in one final pass, so a range's insertions never
//! disturb another range's anchors.
//!
//! The pass is total over well-formed blocks: pool exhaustion simply leaves
//! the coldest candidates in memory, and unknown-to-the-allocator opcodes
//! are scanned generically without splitting a range.

mod aliasing;
mod assign;
mod fixup;
mod liveness;

use crate::{
    codegen::CodeGen,
    ir::{symbol::SymKind, symbol_table::SymIdx, BasicBlock, Statement},
    log::{log, log_ir, should_log_ir, IRPhase, Verbosity},
};
use std::collections::BTreeMap;

/// An inclusive run `[first, last]` of statement indices subject to one
/// round of allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocRange {
    pub first: usize,
    pub last: usize,
}

/// Partition `statements` into allocation ranges.
///
/// Every call terminates a range at its own index; the final range closes at
/// the last statement regardless of opcode. The result exactly partitions
/// `0..statements.len()`: a block whose last statement is a call produces no
/// trailing empty range, and an empty block produces no ranges at all.
pub fn compute_alloc_ranges(statements: &[Statement]) -> Vec<AllocRange> {
    let mut ranges = Vec::with_capacity(statements.len() / 2 + 1);
    let mut current_start = 0;
    for (idx, stmt) in statements.iter().enumerate() {
        if stmt.op.is_call() {
            ranges.push(AllocRange {
                first: current_start,
                last: idx,
            });
            current_start = idx + 1;
        }
    }
    if current_start < statements.len() {
        ranges.push(AllocRange {
            first: current_start,
            last: statements.len() - 1,
        });
    }
    ranges
}

/// Per-symbol allocation state for one range.
///
/// Created lazily when [liveness] first observes a symbol, mutated only by
/// the passes over that range, and discarded at the range's end. Updates are
/// monotone: `aliased` only ever flips to `true`, `first_*` are set once,
/// `last_*` never decrease, and `reg` is assigned at most once.
#[derive(Debug, Default)]
pub(crate) struct SymRegAlloc {
    /// Total number of operand occurrences (defs + uses) in the range.
    pub(crate) use_count: u32,
    /// Statement index of the first write, if any.
    pub(crate) first_def: Option<usize>,
    /// Statement index of the last write, if any.
    pub(crate) last_def: Option<usize>,
    /// Statement index of the first read, if any.
    pub(crate) first_use: Option<usize>,
    /// Statement index of the last read, if any.
    pub(crate) last_use: Option<usize>,
    /// Storage overlaps another referenced symbol; must stay in memory.
    pub(crate) aliased: bool,
    /// The physical register kind and id assigned, if any.
    pub(crate) reg: Option<(SymKind, u32)>,
}

impl SymRegAlloc {
    /// Must the register be initialised from memory at the range's entry?
    /// True when the symbol is read at or before its first write; a missing
    /// first write counts as infinitely late.
    pub(crate) fn needs_load(&self) -> bool {
        match (self.first_use, self.first_def) {
            (Some(u), Some(d)) => u <= d,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// The per-range symbol state map. Keyed by handle so that every iteration
/// over tracked symbols is in deterministic order.
pub(crate) type RangeAllocs = BTreeMap<SymIdx, SymRegAlloc>;

/// Allocate registers for `block`, mutating it in place.
///
/// Operand references to promoted symbols are substituted with register
/// symbols (interned into the block's own table), load `mov`s are inserted
/// at range entries and spill `mov`s at range exits. Spills anchored on a
/// statement that transfers control are placed before it, so a callee always
/// sees memory-backed storage already updated and a branch leaves with the
/// post-spill state committed.
///
/// # Panics
///
/// If a statement references a symbol that is not owned by the block's
/// table.
pub fn allocate_registers(block: &mut BasicBlock, cg: &dyn CodeGen) {
    #[cfg(debug_assertions)]
    block.assert_well_formed();

    if block.statements.is_empty() {
        return;
    }

    if should_log_ir(IRPhase::PreRegAlloc) {
        log_ir(&format!(
            "--- Begin pre-regalloc ---\n{block}--- End pre-regalloc ---\n"
        ));
    }

    let ranges = compute_alloc_ranges(&block.statements);
    let mut loads: BTreeMap<usize, Vec<Statement>> = BTreeMap::new();
    let mut spills: BTreeMap<usize, Vec<Statement>> = BTreeMap::new();

    for range in &ranges {
        let is_last_range = range.last + 1 == block.statements.len();

        let mut allocs = liveness::compute(&block.statements, *range);
        aliasing::mark(&block.statements, &block.symbol_table, *range, &mut allocs);
        assign::run(&block.symbol_table, cg, &mut allocs);
        fixup::rewrite_range(block, *range, &allocs);
        fixup::collect(
            &mut block.symbol_table,
            *range,
            is_last_range,
            &allocs,
            &mut loads,
            &mut spills,
        );
    }

    log(
        Verbosity::PassEvent,
        &format!(
            "regalloc: {} statements, {} ranges, {} loads, {} spills",
            block.statements.len(),
            ranges.len(),
            loads.values().map(Vec::len).sum::<usize>(),
            spills.values().map(Vec::len).sum::<usize>(),
        ),
    );

    fixup::splice(&mut block.statements, loads, spills);

    if should_log_ir(IRPhase::PostRegAlloc) {
        log_ir(&format!(
            "--- Begin post-regalloc ---\n{block}--- End post-regalloc ---\n"
        ));
    }
}
