//! Reduction engines.
//!
//! [`reduce`] folds a whole view to one value. [`reduce_dims_into`] and
//! [`zip_reduce2_dims_into`] reduce a set of axes: the retained ("loop")
//! dimensions are iterated by the traversal engine, and for each retained
//! index the reduced ("core") dimensions are presented to a caller-supplied
//! primitive as positioned sub-views. Results are written in place into the
//! output view, which supports any output shape including the 0-D
//! full-reduction case.
//!
//! How a primitive consumes a multi-dimensional core region (flattening it,
//! walking it recursively) is the primitive's concern; the engine only
//! guarantees the sub-views' shape, strides, and position.

use crate::engine::traverse;
use crate::reduce_view::split_axes;
use crate::view::{StridedArray, StridedArrayMut};
use crate::{Result, StridedError};

/// Full fold: `reduce_fn` over `map_fn` applied to every element.
pub fn reduce<T, U, M, R>(
    src: &StridedArray<'_, T>,
    map_fn: M,
    reduce_fn: R,
    init: U,
) -> Result<U>
where
    T: Copy,
    M: Fn(T) -> U,
    R: Fn(U, U) -> U,
{
    let src_ptr = src.ptr();
    let strides_list = [src.strides()];
    let mut acc = Some(init);
    traverse(
        src.dims(),
        &strides_list,
        &[src.order()],
        &[std::mem::size_of::<T>()],
        None,
        true,
        |offsets, len, inner| {
            let mut off = offsets[0];
            for _ in 0..len {
                let val = unsafe { *src_ptr.offset(off) };
                if let Some(current) = acc.take() {
                    acc = Some(reduce_fn(current, map_fn(val)));
                }
                off += inner[0];
            }
            Ok(())
        },
    )?;
    // The accumulator is threaded through an Option only to move out of the
    // closure; it is always present here.
    acc.ok_or(StridedError::OffsetOverflow)
}

/// Validate a reduction axis list into a per-dimension mask.
fn axis_mask(axes: &[usize], rank: usize) -> Result<Vec<bool>> {
    let mut mask = vec![false; rank];
    for &axis in axes {
        if axis >= rank {
            return Err(StridedError::InvalidAxis { axis, rank });
        }
        if mask[axis] {
            return Err(StridedError::DuplicateAxis { axis });
        }
        mask[axis] = true;
    }
    Ok(mask)
}

/// Reduce `axes` of `src`, writing one primitive result per retained index.
///
/// The primitive receives a sub-view whose shape is the reduced dimensions'
/// extents (original relative order, original strides) positioned at the
/// current retained index.
///
/// Empty cases are no-ops: a zero extent among the retained dimensions, or a
/// zero extent inside a non-empty set of reduced dimensions, returns without
/// invoking the primitive.
pub fn reduce_dims_into<T, U, K>(
    out: &mut StridedArrayMut<'_, U>,
    src: &StridedArray<'_, T>,
    axes: &[usize],
    kernel: K,
) -> Result<()>
where
    K: Fn(&StridedArray<'_, T>) -> U,
{
    let rank = src.rank();
    let mask = axis_mask(axes, rank)?;
    let split = split_axes(src.dims(), src.strides(), &mask);

    let expected = rank - axes.len();
    if out.rank() != expected {
        return Err(StridedError::OutputRankMismatch {
            expected,
            actual: out.rank(),
        });
    }
    if out.dims() != split.loop_dims.as_slice() {
        return Err(StridedError::LoopDimensionMismatch(
            out.dims().to_vec(),
            split.loop_dims.to_vec(),
        ));
    }

    if split.loop_dims.contains(&0) {
        return Ok(());
    }
    if !split.core_dims.is_empty() && split.core_dims.contains(&0) {
        return Ok(());
    }

    let out_ptr = out.ptr();
    let src_offset = src.offset() as isize;
    let strides_list = [out.strides(), split.loop_strides.as_slice()];
    let orders = [out.order(), src.order()];
    let sizes = [std::mem::size_of::<U>(), std::mem::size_of::<T>()];

    traverse(
        &split.loop_dims,
        &strides_list,
        &orders,
        &sizes,
        Some(0),
        false,
        |offsets, len, inner| {
            let mut out_off = offsets[0];
            let mut src_off = offsets[1];
            for _ in 0..len {
                let core = src.subview_unchecked(
                    &split.core_dims,
                    &split.core_strides,
                    (src_offset + src_off) as usize,
                );
                let val = kernel(&core);
                unsafe {
                    *out_ptr.offset(out_off) = val;
                }
                out_off += inner[0];
                src_off += inner[1];
            }
            Ok(())
        },
    )
}

/// Binary reduction: co-iterate two inputs' retained dimensions and feed the
/// primitive a positioned core sub-view of each.
///
/// Inputs must agree on every extent (retained and reduced); the output's
/// shape must equal the retained extents. Empty cases are no-ops exactly as
/// in [`reduce_dims_into`].
pub fn zip_reduce2_dims_into<T, U, K>(
    out: &mut StridedArrayMut<'_, U>,
    a: &StridedArray<'_, T>,
    b: &StridedArray<'_, T>,
    axes: &[usize],
    kernel: K,
) -> Result<()>
where
    K: Fn(&StridedArray<'_, T>, &StridedArray<'_, T>) -> U,
{
    let rank = a.rank();
    if b.rank() != rank {
        return Err(StridedError::RankMismatch(rank, b.rank()));
    }
    let mask = axis_mask(axes, rank)?;
    let split_a = split_axes(a.dims(), a.strides(), &mask);
    let split_b = split_axes(b.dims(), b.strides(), &mask);

    if split_a.loop_dims != split_b.loop_dims {
        return Err(StridedError::LoopDimensionMismatch(
            split_a.loop_dims.to_vec(),
            split_b.loop_dims.to_vec(),
        ));
    }
    if split_a.core_dims != split_b.core_dims {
        return Err(StridedError::ShapeMismatch(
            a.dims().to_vec(),
            b.dims().to_vec(),
        ));
    }

    let expected = rank - axes.len();
    if out.rank() != expected {
        return Err(StridedError::OutputRankMismatch {
            expected,
            actual: out.rank(),
        });
    }
    if out.dims() != split_a.loop_dims.as_slice() {
        return Err(StridedError::LoopDimensionMismatch(
            out.dims().to_vec(),
            split_a.loop_dims.to_vec(),
        ));
    }

    if split_a.loop_dims.contains(&0) {
        return Ok(());
    }
    if !split_a.core_dims.is_empty() && split_a.core_dims.contains(&0) {
        return Ok(());
    }

    let out_ptr = out.ptr();
    let a_offset = a.offset() as isize;
    let b_offset = b.offset() as isize;
    let strides_list = [
        out.strides(),
        split_a.loop_strides.as_slice(),
        split_b.loop_strides.as_slice(),
    ];
    let orders = [out.order(), a.order(), b.order()];
    let sizes = [
        std::mem::size_of::<U>(),
        std::mem::size_of::<T>(),
        std::mem::size_of::<T>(),
    ];

    traverse(
        &split_a.loop_dims,
        &strides_list,
        &orders,
        &sizes,
        Some(0),
        false,
        |offsets, len, inner| {
            let mut out_off = offsets[0];
            let mut a_off = offsets[1];
            let mut b_off = offsets[2];
            for _ in 0..len {
                let a_core = a.subview_unchecked(
                    &split_a.core_dims,
                    &split_a.core_strides,
                    (a_offset + a_off) as usize,
                );
                let b_core = b.subview_unchecked(
                    &split_b.core_dims,
                    &split_b.core_strides,
                    (b_offset + b_off) as usize,
                );
                let val = kernel(&a_core, &b_core);
                unsafe {
                    *out_ptr.offset(out_off) = val;
                }
                out_off += inner[0];
                a_off += inner[1];
                b_off += inner[2];
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::MemoryOrder;

    const RM: MemoryOrder = MemoryOrder::RowMajor;

    fn dot_kernel(x: &StridedArray<'_, f64>, y: &StridedArray<'_, f64>) -> f64 {
        let mut acc = 0.0;
        let mut idx = vec![0usize; x.rank()];
        loop {
            acc += x.get(&idx) * y.get(&idx);
            let mut level = x.rank();
            loop {
                if level == 0 {
                    return acc;
                }
                level -= 1;
                idx[level] += 1;
                if idx[level] < x.dims()[level] {
                    break;
                }
                idx[level] = 0;
            }
        }
    }

    #[test]
    fn test_axis_mask_rejects_out_of_range() {
        assert!(matches!(
            axis_mask(&[3], 3),
            Err(StridedError::InvalidAxis { axis: 3, rank: 3 })
        ));
    }

    #[test]
    fn test_axis_mask_rejects_duplicates() {
        assert!(matches!(
            axis_mask(&[1, 1], 3),
            Err(StridedError::DuplicateAxis { axis: 1 })
        ));
    }

    #[test]
    fn test_output_rank_checked() {
        let data: Vec<f64> = (1..=8).map(|v| v as f64).collect();
        let src = StridedArray::new(&data, &[2, 2, 2], &[4, 2, 1], 0, RM).unwrap();
        let mut out_data = vec![0.0; 4];
        let mut out = StridedArrayMut::new(&mut out_data, &[2, 2], &[2, 1], 0, RM).unwrap();
        let err = reduce_dims_into(&mut out, &src, &[1, 2], |v| *v.get(&[0, 0]));
        assert!(matches!(
            err,
            Err(StridedError::OutputRankMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_binary_dot_reduce_over_trailing_axes() {
        // [2,2,2] filled 1..=8 in both inputs, reduce axes [1,2] with a dot
        // primitive: dot([1,2,3,4],[1,2,3,4]) = 30, dot([5..8],[5..8]) = 174.
        let data: Vec<f64> = (1..=8).map(|v| v as f64).collect();
        let x = StridedArray::new(&data, &[2, 2, 2], &[4, 2, 1], 0, RM).unwrap();
        let y = StridedArray::new(&data, &[2, 2, 2], &[4, 2, 1], 0, RM).unwrap();
        let mut out_data = vec![0.0; 2];
        let mut out = StridedArrayMut::new(&mut out_data, &[2], &[1], 0, RM).unwrap();

        zip_reduce2_dims_into(&mut out, &x, &y, &[1, 2], dot_kernel).unwrap();
        assert_eq!(out_data, vec![30.0, 174.0]);
    }

    #[test]
    fn test_full_reduction_to_scalar() {
        // Reduce every axis of [1,3,2,2] with values 1..=12: Σ v² = 650.
        let data: Vec<f64> = (1..=12).map(|v| v as f64).collect();
        let x = StridedArray::new(&data, &[1, 3, 2, 2], &[12, 4, 2, 1], 0, RM).unwrap();
        let y = StridedArray::new(&data, &[1, 3, 2, 2], &[12, 4, 2, 1], 0, RM).unwrap();
        let mut out_data = vec![0.0];
        let mut out = StridedArrayMut::new(&mut out_data, &[], &[], 0, RM).unwrap();

        zip_reduce2_dims_into(&mut out, &x, &y, &[0, 1, 2, 3], dot_kernel).unwrap();
        assert_eq!(out_data[0], 650.0);
    }

    #[test]
    fn test_empty_loop_dim_is_noop() {
        let data: Vec<f64> = Vec::new();
        let src = StridedArray::new(&data, &[0, 3], &[3, 1], 0, RM).unwrap();
        let mut out_data = vec![42.0; 1];
        let calls = std::cell::Cell::new(0usize);
        {
            let mut out = StridedArrayMut::new(&mut out_data, &[0], &[1], 0, RM).unwrap();
            reduce_dims_into(&mut out, &src, &[1], |_| {
                calls.set(calls.get() + 1);
                0.0
            })
            .unwrap();
        }
        assert_eq!(calls.get(), 0);
        assert_eq!(out_data[0], 42.0);
    }

    #[test]
    fn test_empty_core_is_noop() {
        let data: Vec<f64> = Vec::new();
        let src = StridedArray::new(&data, &[2, 0], &[0, 1], 0, RM).unwrap();
        let mut out_data = vec![7.0, 7.0];
        let calls = std::cell::Cell::new(0usize);
        {
            let mut out = StridedArrayMut::new(&mut out_data, &[2], &[1], 0, RM).unwrap();
            reduce_dims_into(&mut out, &src, &[1], |_| {
                calls.set(calls.get() + 1);
                0.0
            })
            .unwrap();
        }
        assert_eq!(calls.get(), 0);
        assert_eq!(out_data, vec![7.0, 7.0]);
    }

    #[test]
    fn test_reduce_full_fold() {
        let data: Vec<f64> = (0..20).map(|v| v as f64).collect();
        let src = StridedArray::new(&data, &[4, 5], &[5, 1], 0, RM).unwrap();
        let total = reduce(&src, |x| x, |a, b| a + b, 0.0).unwrap();
        assert_eq!(total, 190.0);
    }

    #[test]
    fn test_reduce_mid_axis_sum() {
        // Sum over the middle axis of [2,3,2], contiguous row-major.
        let data: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let src = StridedArray::new(&data, &[2, 3, 2], &[6, 2, 1], 0, RM).unwrap();
        let mut out_data = vec![0.0; 4];
        let mut out = StridedArrayMut::new(&mut out_data, &[2, 2], &[2, 1], 0, RM).unwrap();

        reduce_dims_into(&mut out, &src, &[1], |core| {
            let mut acc = 0.0;
            for i in 0..core.dims()[0] {
                acc += *core.get(&[i]);
            }
            acc
        })
        .unwrap();

        // out[i][k] = Σ_j src[i][j][k]
        assert_eq!(out_data, vec![6.0, 9.0, 24.0, 27.0]);
    }
}
