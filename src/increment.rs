//! Per-level offset increments for carry-style nested iteration.
//!
//! Instead of recomputing `offset + Σ index[i] * stride[i]` at every element,
//! the engine keeps one running offset per array and adds a precomputed
//! increment whenever a loop level advances. Advancing level `L` resets level
//! `L-1` to index zero, so the increment folds the step and the reset into a
//! single addition.

use crate::view::StrideVec;

/// Increments for dims/strides given innermost first.
///
/// `inc[0] = stride[0]`; for `L > 0`,
/// `inc[L] = stride[L] - dims[L-1] * stride[L-1]` — step level `L` once and
/// unwind the completed level `L-1` loop. Wrapping levels apply their
/// increment too, so resets cascade outward one level at a time.
///
/// Blocked traversal calls this per tile with the tile's actual sub-extents:
/// an edge tile iterates fewer elements per level, so its carry terms differ
/// from interior tiles.
pub(crate) fn offset_increments(dims: &[usize], strides: &[isize]) -> StrideVec {
    let rank = dims.len();
    let mut inc = StrideVec::with_capacity(rank);
    for level in 0..rank {
        if level == 0 {
            inc.push(strides[0]);
        } else {
            inc.push(strides[level] - dims[level - 1] as isize * strides[level - 1]);
        }
    }
    inc
}
