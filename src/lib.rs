//! The register allocation core of a basic-block dynamic recompiler.
//!
//! The input is a [ir::BasicBlock]: a straight-line sequence of three-address
//! statements whose operands reference symbols interned in the block's
//! [ir::symbol_table::SymbolTable]. The output is the same block, mutated in
//! place so that the hottest memory-backed symbols live in physical registers
//! for sub-ranges of the block, with explicit `mov`s loading them at range
//! entry and spilling them back at range exit.
//!
//! The pass pipeline lives in [regalloc]; the backend is only ever consulted
//! for its register counts via the [codegen::CodeGen] trait. See the
//! [regalloc] module docs for the allocation model and its invariants.

pub mod codegen;
pub mod ir;
pub mod log;
pub mod regalloc;
