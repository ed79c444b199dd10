/// Semantic operations the lowering walk emits. `TapeBlock::ir` expands
/// each of these into primitives while tracking the pointer, so the
/// AST-level code never reasons about relative moves.
///
/// Cells named `tmp` must hold zero on entry; every operation that
/// consumes a cell leaves it at zero, which is what lets the planner
/// hand scratch cells back out without emitting clears.
#[derive(Debug)]
pub enum IrOp {
    /// dst = value (clears first; negative values wrap at runtime).
    Set { dst: usize, value: i64 },

    /// dst = 0 via the self-terminating decrement loop.
    Clear { dst: usize },

    /// dst += amount (or -= for negative amounts), no clearing.
    Add { dst: usize, amount: i64 },

    /// While src != 0: src -= 1, and each destination is incremented
    /// (or decremented when `negate`). Consumes src.
    Transfer { src: usize, dsts: Vec<TransferDest> },

    /// dst += src, preserving src by staging through tmp.
    CopyPreserving { src: usize, dst: usize, tmp: usize },

    /// x = max(x - y, 0), consuming y. Never wraps, so no loop in the
    /// expansion runs longer than the operands' actual magnitudes.
    SaturatingSub { x: usize, y: usize, tmp: usize },

    /// dst += (src != 0) as 0/1, consuming src. dst must be zero when
    /// the caller wants a pure boolean.
    BoolFromNonzero { src: usize, dst: usize },

    /// dst = (src == 0) as 0/1, consuming src. dst must be zero.
    BoolFromZero { src: usize, dst: usize },

    /// flag = 0 if src != 0, consuming src. Leaves flag untouched when
    /// src is zero.
    ClearIfNonzero { src: usize, flag: usize },

    /// Opens a zero-test loop keyed on `cell`. The matching `LoopEnd`
    /// must name the same cell; the block keeps the pointer there at
    /// both brackets, which is what keeps generated code well-nested
    /// and re-entrant.
    LoopBegin { cell: usize },
    LoopEnd { cell: usize },

    /// Emit the output/input primitive on `cell`.
    Output { cell: usize },
    Input { cell: usize },

    /// Park the pointer on `cell`. Lowering helpers end with this so
    /// "pointer rests on the result" is an explicit postcondition.
    Seek { cell: usize },
}

#[derive(Debug)]
pub struct TransferDest {
    pub cell: usize,
    pub negate: bool,
}

impl TransferDest {
    pub fn add(cell: usize) -> TransferDest {
        TransferDest { cell, negate: false }
    }

    pub fn sub(cell: usize) -> TransferDest {
        TransferDest { cell, negate: true }
    }
}
