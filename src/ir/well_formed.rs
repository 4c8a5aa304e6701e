//! Block well-formedness checks.
//!
//! These are structural checks that no pass should ever trip on input built
//! through the normal APIs; they exist to turn silent corruption (an operand
//! handle minted by a different table) into an immediate, diagnosable panic.
//! Only compiled in for debug builds and tests.

use super::BasicBlock;

impl BasicBlock {
    /// Check structural invariants of this block, panicking if any are
    /// violated.
    ///
    /// Currently checked: every operand of every statement references a
    /// symbol owned by this block's table.
    pub(crate) fn assert_well_formed(&self) {
        for (idx, stmt) in self.statements.iter().enumerate() {
            stmt.for_each_operand(&mut |sref, _| {
                assert!(
                    self.symbol_table.contains(sref.sym()),
                    "statement {idx} references a symbol not owned by this block's table"
                );
            });
        }
    }
}
