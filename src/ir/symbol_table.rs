//! The per-block symbol interning table.
//!
//! The table is an arena vending stable [SymIdx] handles: it is the sole
//! owner of every [Symbol] it hands out, and every other structure (operand
//! slots, per-range allocation records) holds non-owning handles that stay
//! valid for the table's lifetime. Interning means handle equality is
//! structural symbol equality, which the allocator leans on throughout.
//!
//! [remove](SymbolTable::remove) only unlinks a symbol's *value* from the
//! intern map: the arena slot stays behind so that handles held elsewhere
//! (e.g. by a dead-code pass that is still walking statements) do not
//! dangle. [clear](SymbolTable::clear) drops everything and invalidates all
//! outstanding handles.

use super::{
    symbol::{SymKind, Symbol},
    SymbolRef,
};
use index_vec::IndexVec;
use std::collections::HashMap;

index_vec::define_index_type! {
    /// A handle to a [Symbol] interned in a [SymbolTable].
    pub struct SymIdx = u32;
}

/// An interning arena of [Symbol]s.
///
/// Movable but deliberately not clonable: handles are only meaningful
/// against the table that minted them.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Every symbol ever interned. Slots are never reused; handles index
    /// into this.
    arena: IndexVec<SymIdx, Symbol>,
    /// Maps a symbol value to its canonical arena slot.
    interned: HashMap<Symbol, SymIdx>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            arena: IndexVec::with_capacity(512),
            interned: HashMap::with_capacity(512),
        }
    }

    /// Intern `sym`, returning the canonical handle for its value. Two calls
    /// with equal symbols return the same handle.
    pub fn intern(&mut self, sym: Symbol) -> SymIdx {
        if let Some(&idx) = self.interned.get(&sym) {
            return idx;
        }
        let idx = self.arena.push(sym);
        self.interned.insert(sym, idx);
        idx
    }

    /// Intern the symbol `(kind, value_low, value_high)`.
    pub fn make_symbol(&mut self, kind: SymKind, value_low: u32, value_high: u32) -> SymIdx {
        self.intern(Symbol::new(kind, value_low, value_high))
    }

    /// Return the symbol behind `idx`.
    ///
    /// # Panics
    ///
    /// If `idx` was not minted by this table.
    pub fn symbol(&self, idx: SymIdx) -> Symbol {
        self.arena[idx]
    }

    /// Was `idx` minted by this table?
    pub fn contains(&self, idx: SymIdx) -> bool {
        idx.index() < self.arena.len()
    }

    /// Resolve `sref`'s symbol, but only if it has the expected kind.
    pub fn symbol_of_kind(&self, kind: SymKind, sref: SymbolRef) -> Option<Symbol> {
        let sym = self.symbol(sref.sym());
        (sym.kind() == kind).then_some(sym)
    }

    /// Unlink the symbol behind `idx` from the intern map. The arena slot
    /// stays valid, so outstanding handles can still be resolved; a later
    /// [intern](Self::intern) of an equal value mints a fresh handle.
    ///
    /// # Panics
    ///
    /// If `idx` was not minted by this table.
    pub fn remove(&mut self, idx: SymIdx) {
        self.interned.remove(&self.arena[idx]);
    }

    /// Drop all symbols. All outstanding handles become invalid.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.interned.clear();
    }

    /// How many symbols are currently interned?
    pub fn len(&self) -> usize {
        self.interned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interned.is_empty()
    }

    /// Iterate, in handle order, over the handles of all currently interned
    /// symbols. Removed symbols are skipped.
    pub fn symbols(&self) -> impl Iterator<Item = SymIdx> + '_ {
        self.arena
            .iter_enumerated()
            .filter_map(|(idx, sym)| (self.interned.get(sym) == Some(&idx)).then_some(idx))
    }
}
