//! Rank-generic traversal drivers.
//!
//! The engine iterates a set of co-located arrays and hands the caller one
//! inner run at a time: `f(offsets, len, inner_strides)` — per-array element
//! offsets for the run start, the run length, and each array's innermost
//! stride. Operation bodies keep a tight pointer loop at the innermost level
//! while all loop-order, blocking, and collapse decisions live here.
//!
//! Offsets are relative to each view's own base (its `offset` field); the
//! engine knows nothing about element types or buffers beyond per-array
//! stride vectors.

use crate::dispatch::{select_strategy, Strategy};
use crate::increment::offset_increments;
use crate::order::loop_order;
use crate::view::{DimVec, MemoryOrder, StrideVec};
use crate::{block, Result};
use smallvec::SmallVec;

/// Per-array offset scratch. Operations rarely co-iterate more than four
/// arrays, so this stays inline.
pub(crate) type OffsetVec = SmallVec<[isize; 4]>;

/// Walk `dims` once for every array in `strides_list`, invoking `f` per
/// inner run. Exactly one strategy executes per call.
///
/// `dims` is the shared (already fused, if the caller fuses) iteration
/// shape; `orders` and `elem_sizes` are per-array; `dest_index` marks the
/// output array for loop-order weighting; `allow_contiguous_collapse`
/// enables the whole-view 1-D collapse (element-wise ops only — reductions
/// must keep their loop/core split intact).
pub(crate) fn traverse<F>(
    dims: &[usize],
    strides_list: &[&[isize]],
    orders: &[MemoryOrder],
    elem_sizes: &[usize],
    dest_index: Option<usize>,
    allow_contiguous_collapse: bool,
    mut f: F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let narrays = strides_list.len();
    match select_strategy(dims, strides_list, orders, allow_contiguous_collapse) {
        Strategy::Empty => Ok(()),
        Strategy::ZeroRank => {
            let offsets = OffsetVec::from_elem(0, narrays);
            let inner = StrideVec::from_elem(0, narrays);
            f(&offsets, 1, &inner)
        }
        Strategy::OneD { len, inner_strides } => {
            let offsets = OffsetVec::from_elem(0, narrays);
            f(&offsets, len, &inner_strides)
        }
        Strategy::DirectNested => {
            let plan = ordered_plan(dims, strides_list, orders, dest_index);
            let base = OffsetVec::from_elem(0, narrays);
            run_direct(&plan.dims, &plan.strides, &base, &mut f)
        }
        Strategy::BlockedNested => {
            let plan = ordered_plan(dims, strides_list, orders, dest_index);
            let edge = block::block_edge(elem_sizes);
            run_blocked(&plan.dims, &plan.strides, edge, &mut f)
        }
        Strategy::LinearFallback => {
            let plan = ordered_plan(dims, strides_list, orders, dest_index);
            run_linear(&plan.dims, &plan.strides, &mut f)
        }
    }
}

/// Shape-agreement check for co-iterated views (the validation boundary:
/// the traversal drivers themselves never validate).
pub(crate) fn ensure_same_shape(a: &[usize], b: &[usize]) -> Result<()> {
    if a.len() != b.len() {
        return Err(crate::StridedError::RankMismatch(a.len(), b.len()));
    }
    if a != b {
        return Err(crate::StridedError::ShapeMismatch(a.to_vec(), b.to_vec()));
    }
    Ok(())
}

/// Call-local iteration plan: dims and per-array strides permuted so that
/// index 0 is the innermost level. Input views are never mutated.
struct OrderedPlan {
    dims: DimVec,
    strides: Vec<StrideVec>,
}

fn ordered_plan(
    dims: &[usize],
    strides_list: &[&[isize]],
    orders: &[MemoryOrder],
    dest_index: Option<usize>,
) -> OrderedPlan {
    let tie_break = dest_index.map_or(orders[0], |i| orders[i]);
    let perm = loop_order(dims, strides_list, dest_index, tie_break);
    OrderedPlan {
        dims: perm.iter().map(|&d| dims[d]).collect(),
        strides: strides_list
            .iter()
            .map(|s| perm.iter().map(|&d| s[d]).collect())
            .collect(),
    }
}

/// Direct nested loops (dims innermost-first, rank >= 1).
///
/// One running offset per array; level advances apply the precomputed carry
/// increments, cascading outward when a level wraps. The innermost level is
/// not looped here — it is handed to `f` as a run.
pub(crate) fn run_direct<F>(
    dims: &[usize],
    strides: &[StrideVec],
    base: &[isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()> + ?Sized,
{
    let rank = dims.len();
    let incs: Vec<StrideVec> = strides.iter().map(|s| offset_increments(dims, s)).collect();
    let inner_strides: StrideVec = strides.iter().map(|s| s[0]).collect();
    let d0 = dims[0];
    let outer_total: usize = dims[1..].iter().product();

    let mut offsets = OffsetVec::from_slice(base);
    let mut counters = DimVec::from_elem(0, rank);

    for _ in 0..outer_total {
        f(&offsets, d0, &inner_strides)?;
        for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
            *offset += d0 as isize * s[0];
        }
        let mut level = 1;
        while level < rank {
            for (offset, inc) in offsets.iter_mut().zip(incs.iter()) {
                *offset += inc[level];
            }
            counters[level] += 1;
            if counters[level] < dims[level] {
                break;
            }
            counters[level] = 0;
            level += 1;
        }
    }
    Ok(())
}

/// Blocked nested loops: an odometer over tile origins (innermost tile
/// walking contiguously), then the direct driver inside each tile.
///
/// Edge tiles shrink to the remaining extent, and `run_direct` recomputes
/// carry increments from the tile's actual sub-extents, so boundary tiles
/// step correctly without any special casing here.
pub(crate) fn run_blocked<F>(
    dims: &[usize],
    strides: &[StrideVec],
    edge: usize,
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()> + ?Sized,
{
    let rank = dims.len();
    let edge = edge.max(1);
    let mut origins = DimVec::from_elem(0, rank);
    let mut tile = DimVec::from_elem(0, rank);
    let mut base = OffsetVec::from_elem(0, strides.len());

    loop {
        for level in 0..rank {
            tile[level] = edge.min(dims[level] - origins[level]);
        }
        for (b, s) in base.iter_mut().zip(strides.iter()) {
            *b = origins
                .iter()
                .zip(s.iter())
                .map(|(&o, &st)| o as isize * st)
                .sum();
        }
        run_direct(&tile, strides, &base, f)?;

        let mut level = 0;
        loop {
            origins[level] += edge;
            if origins[level] < dims[level] {
                break;
            }
            origins[level] = 0;
            level += 1;
            if level == rank {
                return Ok(());
            }
        }
    }
}

/// Universal fallback: decompose each linear position into per-array
/// offsets through the permuted shape. Works for any rank and layout at the
/// cost of per-element index arithmetic instead of incremental stepping.
pub(crate) fn run_linear<F>(dims: &[usize], strides: &[StrideVec], f: &mut F) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()> + ?Sized,
{
    let rank = dims.len();
    let total: usize = dims.iter().product();
    let inner_strides: StrideVec = strides.iter().map(|s| s[0]).collect();
    let mut offsets = OffsetVec::from_elem(0, strides.len());

    for k in 0..total {
        let mut rem = k;
        offsets.iter_mut().for_each(|o| *o = 0);
        for level in 0..rank {
            let c = (rem % dims[level]) as isize;
            rem /= dims[level];
            for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                *offset += c * s[level];
            }
        }
        f(&offsets, 1, &inner_strides)?;
    }
    Ok(())
}
