//! Traversal strategy selection.
//!
//! One strategy is chosen per call, before any element is touched, and never
//! revisited mid-call. The ladder runs cheapest-first: empty and scalar
//! cases, collapses to a single 1-D run, then direct nested loops when a
//! plain interchange already makes the pass cache-friendly, blocked loops
//! when the arrays disagree about which dimension should iterate fastest,
//! and finally a linear-index walk for ranks past the nested-loop bound.

use crate::view::{MemoryOrder, StrideVec};
use crate::MAX_NESTED_RANK;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// Some extent is zero: no elements, no callback invocations.
    Empty,
    /// Rank 0: the single addressed element, no loop.
    ZeroRank,
    /// One 1-D run covers the whole iteration space (true rank 1, all-but-one
    /// singleton dimensions, or a full contiguity collapse).
    OneD { len: usize, inner_strides: StrideVec },
    /// Nested loops over the interchanged dimensions, unblocked.
    DirectNested,
    /// Nested loops with every level tiled to the advisor's edge.
    BlockedNested,
    /// Per-element linear-index decomposition; any rank, any layout.
    LinearFallback,
}

pub(crate) fn select_strategy(
    dims: &[usize],
    strides_list: &[&[isize]],
    orders: &[MemoryOrder],
    allow_contiguous_collapse: bool,
) -> Strategy {
    if dims.contains(&0) {
        return Strategy::Empty;
    }
    let rank = dims.len();
    if rank == 0 {
        return Strategy::ZeroRank;
    }
    if rank == 1 {
        return Strategy::OneD {
            len: dims[0],
            inner_strides: strides_list.iter().map(|s| s[0]).collect(),
        };
    }

    // All-but-one singleton: only one dimension actually iterates.
    let mut iterating = dims.iter().enumerate().filter(|(_, &d)| d > 1);
    if let Some((dim, &len)) = iterating.next() {
        if iterating.next().is_none() {
            return Strategy::OneD {
                len,
                inner_strides: strides_list.iter().map(|s| s[dim]).collect(),
            };
        }
    } else {
        // Every extent is 1: a single element behind a multi-dim shape.
        return Strategy::OneD {
            len: 1,
            inner_strides: StrideVec::from_elem(0, strides_list.len()),
        };
    }

    let shared_order = orders.windows(2).all(|w| w[0] == w[1]);

    if allow_contiguous_collapse && shared_order {
        let signs: Option<Vec<isize>> = strides_list
            .iter()
            .map(|s| dense_direction(dims, s, orders[0]))
            .collect();
        if let Some(signs) = signs {
            // Every array is one unbroken dense run walked monotonically, so
            // the order-major enumeration is an arithmetic ±1 progression
            // from each array's own offset.
            return Strategy::OneD {
                len: dims.iter().product(),
                inner_strides: signs.into_iter().collect(),
            };
        }
    }

    if rank > MAX_NESTED_RANK {
        return Strategy::LinearFallback;
    }

    let consistent = shared_order
        && strides_list.iter().all(|s| sign_consistent(dims, s))
        && agree_on_innermost(dims, strides_list);
    if consistent {
        Strategy::DirectNested
    } else {
        Strategy::BlockedNested
    }
}

/// Direction of a dense monotonic view, or `None` if the view is not one
/// unbroken run in its declared order.
///
/// Walking minor to major per the declared order, each non-singleton
/// dimension's |stride| must equal the product of the extents inside it, and
/// all non-singleton strides must share one sign. This is stronger than the
/// `max - min + 1 == total` span test: it also pins the logical enumeration
/// to an arithmetic progression, which is what keeps multi-array pairings
/// intact after the collapse.
fn dense_direction(dims: &[usize], strides: &[isize], order: MemoryOrder) -> Option<isize> {
    let idx: Box<dyn Iterator<Item = usize>> = match order {
        MemoryOrder::RowMajor => Box::new((0..dims.len()).rev()),
        MemoryOrder::ColMajor => Box::new(0..dims.len()),
    };
    let mut expected = 1usize;
    let mut sign = 0isize;
    for i in idx {
        if dims[i] <= 1 {
            continue;
        }
        let s = strides[i];
        if s.unsigned_abs() != expected {
            return None;
        }
        let this_sign = s.signum();
        if sign == 0 {
            sign = this_sign;
        } else if sign != this_sign {
            return None;
        }
        expected = expected.saturating_mul(dims[i]);
    }
    Some(if sign == 0 { 1 } else { sign })
}

/// Whether all non-singleton, non-broadcast strides of one array share a
/// sign (monotonic iteration direction).
fn sign_consistent(dims: &[usize], strides: &[isize]) -> bool {
    let mut sign = 0isize;
    for (&d, &s) in dims.iter().zip(strides.iter()) {
        if d <= 1 || s == 0 {
            continue;
        }
        let this_sign = s.signum();
        if sign == 0 {
            sign = this_sign;
        } else if sign != this_sign {
            return false;
        }
    }
    true
}

/// Whether every array wants the same dimension innermost. When they
/// disagree (a transpose-style pairing), no single interchange serves all
/// arrays and tiling is what bounds the working set.
fn agree_on_innermost(dims: &[usize], strides_list: &[&[isize]]) -> bool {
    let mut first: Option<usize> = None;
    for strides in strides_list {
        let mut best: Option<(usize, usize)> = None;
        for (i, (&d, &s)) in dims.iter().zip(strides.iter()).enumerate() {
            if d <= 1 || s == 0 {
                continue;
            }
            let mag = s.unsigned_abs();
            if best.map_or(true, |(_, m)| mag < m) {
                best = Some((i, mag));
            }
        }
        let Some((dim, _)) = best else { continue };
        match first {
            None => first = Some(dim),
            Some(f) if f != dim => return false,
            _ => {}
        }
    }
    true
}
