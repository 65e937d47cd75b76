//! Copy-family and arithmetic operations built on the traversal engine.

use crate::engine::{ensure_same_shape, traverse};
use crate::fuse::fuse_dims;
use crate::map::{map_into, zip_map2_into};
use crate::reduce::reduce;
use crate::view::{dense_strides, StridedArray, StridedArrayMut};
use crate::{Result, StridedError};
use num_complex::ComplexFloat;
use num_traits::Zero;
use std::ops::{Add, Mul};

/// Copy `src` into `dst` element-wise over the shared logical shape.
pub fn copy_into<T>(dst: &mut StridedArrayMut<'_, T>, src: &StridedArray<'_, T>) -> Result<()>
where
    T: Copy,
{
    map_into(dst, src, |x| x)
}

/// Complex-conjugating copy. For real element types this is a plain copy.
pub fn conj_into<T>(dst: &mut StridedArrayMut<'_, T>, src: &StridedArray<'_, T>) -> Result<()>
where
    T: ComplexFloat,
{
    map_into(dst, src, |x| x.conj())
}

/// `dst = a + b` element-wise.
pub fn add_into<T>(
    dst: &mut StridedArrayMut<'_, T>,
    a: &StridedArray<'_, T>,
    b: &StridedArray<'_, T>,
) -> Result<()>
where
    T: Copy + Add<Output = T>,
{
    zip_map2_into(dst, a, b, |x, y| x + y)
}

/// `dst = a * b` element-wise.
pub fn mul_into<T>(
    dst: &mut StridedArrayMut<'_, T>,
    a: &StridedArray<'_, T>,
    b: &StridedArray<'_, T>,
) -> Result<()>
where
    T: Copy + Mul<Output = T>,
{
    zip_map2_into(dst, a, b, |x, y| x * y)
}

/// `y = alpha * x + y` element-wise, in place.
pub fn axpy_into<T>(
    y: &mut StridedArrayMut<'_, T>,
    alpha: T,
    x: &StridedArray<'_, T>,
) -> Result<()>
where
    T: Copy + Add<Output = T> + Mul<Output = T>,
{
    ensure_same_shape(y.dims(), x.dims())?;

    let y_ptr = y.ptr();
    let x_ptr = x.ptr();
    let strides_list = [y.strides(), x.strides()];
    let fused = fuse_dims(y.dims(), &strides_list);

    traverse(
        &fused,
        &strides_list,
        &[y.order(), x.order()],
        &[std::mem::size_of::<T>(), std::mem::size_of::<T>()],
        Some(0),
        true,
        |offsets, len, inner| {
            let mut py = unsafe { y_ptr.offset(offsets[0]) };
            let mut px = unsafe { x_ptr.offset(offsets[1]) };
            for _ in 0..len {
                unsafe {
                    *py = alpha * *px + *py;
                    py = py.offset(inner[0]);
                    px = px.offset(inner[1]);
                }
            }
            Ok(())
        },
    )
}

/// Sum of all addressed elements (zero for an empty view).
pub fn sum<T>(src: &StridedArray<'_, T>) -> Result<T>
where
    T: Copy + Zero + Add<Output = T>,
{
    reduce(src, |x| x, |a, b| a + b, T::zero())
}

/// Inner product of two views over the shared logical shape.
pub fn dot<T>(a: &StridedArray<'_, T>, b: &StridedArray<'_, T>) -> Result<T>
where
    T: Copy + Zero + Add<Output = T> + Mul<Output = T>,
{
    ensure_same_shape(a.dims(), b.dims())?;

    let a_ptr = a.ptr();
    let b_ptr = b.ptr();
    let strides_list = [a.strides(), b.strides()];
    let fused = fuse_dims(a.dims(), &strides_list);
    let mut acc = T::zero();

    traverse(
        &fused,
        &strides_list,
        &[a.order(), b.order()],
        &[std::mem::size_of::<T>(), std::mem::size_of::<T>()],
        None,
        true,
        |offsets, len, inner| {
            let mut pa = unsafe { a_ptr.offset(offsets[0]) };
            let mut pb = unsafe { b_ptr.offset(offsets[1]) };
            for _ in 0..len {
                unsafe {
                    acc = acc + *pa * *pb;
                    pa = pa.offset(inner[0]);
                    pb = pb.offset(inner[1]);
                }
            }
            Ok(())
        },
    )?;
    Ok(acc)
}

/// Concatenate `srcs` along `axis` into `dst`.
///
/// Every source must match `dst` on all other extents, and the source
/// extents along `axis` must sum to `dst`'s. Zero-extent sources are
/// skipped.
pub fn concat_into<T>(
    dst: &mut StridedArrayMut<'_, T>,
    srcs: &[&StridedArray<'_, T>],
    axis: usize,
) -> Result<()>
where
    T: Copy,
{
    let rank = dst.rank();
    if axis >= rank {
        return Err(StridedError::InvalidAxis { axis, rank });
    }
    let mut total = 0usize;
    for src in srcs {
        if src.rank() != rank {
            return Err(StridedError::RankMismatch(rank, src.rank()));
        }
        for (d, (&sd, &dd)) in src.dims().iter().zip(dst.dims().iter()).enumerate() {
            if d != axis && sd != dd {
                return Err(StridedError::ShapeMismatch(
                    dst.dims().to_vec(),
                    src.dims().to_vec(),
                ));
            }
        }
        total += src.dims()[axis];
    }
    if total != dst.dims()[axis] {
        let mut expected = dst.dims().to_vec();
        expected[axis] = total;
        return Err(StridedError::ShapeMismatch(dst.dims().to_vec(), expected));
    }

    let dst_ptr = dst.ptr();
    let axis_stride = dst.strides()[axis];
    let dst_order = dst.order();
    let sizes = [std::mem::size_of::<T>(), std::mem::size_of::<T>()];
    let mut used = 0usize;

    for src in srcs {
        let section_ptr = unsafe { dst_ptr.offset(used as isize * axis_stride) };
        let src_ptr = src.ptr();
        let strides_list = [dst.strides(), src.strides()];
        let fused = fuse_dims(src.dims(), &strides_list);

        traverse(
            &fused,
            &strides_list,
            &[dst_order, src.order()],
            &sizes,
            Some(0),
            true,
            |offsets, len, inner| {
                let mut d = unsafe { section_ptr.offset(offsets[0]) };
                let mut s = unsafe { src_ptr.offset(offsets[1]) };
                for _ in 0..len {
                    unsafe {
                        *d = *s;
                        d = d.offset(inner[0]);
                        s = s.offset(inner[1]);
                    }
                }
                Ok(())
            },
        )?;
        used += src.dims()[axis];
    }
    Ok(())
}

/// Copy `src` into the rank-1 view `dst` in `src`'s order-major logical
/// enumeration.
///
/// The destination is addressed through a virtual shape: dense strides for
/// `src`'s dims in `src`'s declared order, scaled by `dst`'s own stride, so
/// flattening is one co-iterated copy with no index juggling.
pub fn flatten_into<T>(dst: &mut StridedArrayMut<'_, T>, src: &StridedArray<'_, T>) -> Result<()>
where
    T: Copy,
{
    if dst.rank() != 1 {
        return Err(StridedError::RankMismatch(1, dst.rank()));
    }
    if dst.dims()[0] != src.len() {
        return Err(StridedError::ShapeMismatch(
            dst.dims().to_vec(),
            vec![src.len()],
        ));
    }

    let unit = dst.strides()[0];
    let mut vstrides = dense_strides(src.dims(), src.order());
    for s in vstrides.iter_mut() {
        *s *= unit;
    }

    let dst_ptr = dst.ptr();
    let src_ptr = src.ptr();
    let strides_list = [vstrides.as_slice(), src.strides()];
    let fused = fuse_dims(src.dims(), &strides_list);

    traverse(
        &fused,
        &strides_list,
        &[src.order(), src.order()],
        &[std::mem::size_of::<T>(), std::mem::size_of::<T>()],
        Some(0),
        true,
        |offsets, len, inner| {
            let mut d = unsafe { dst_ptr.offset(offsets[0]) };
            let mut s = unsafe { src_ptr.offset(offsets[1]) };
            for _ in 0..len {
                unsafe {
                    *d = *s;
                    d = d.offset(inner[0]);
                    s = s.offset(inner[1]);
                }
            }
            Ok(())
        },
    )
}
