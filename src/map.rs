//! Element-wise dispatchers.
//!
//! Each entry point validates shape agreement, fuses jointly-contiguous
//! dimensions, and hands the engine a pointer loop for the innermost run.
//! Results are written into the destination view; nothing is returned.

use crate::engine::{ensure_same_shape, traverse};
use crate::fuse::fuse_dims;
use crate::view::{StridedArray, StridedArrayMut};
use crate::Result;

/// `dst[i] = f(src[i])` over the shared logical shape.
pub fn map_into<T, U, F>(
    dst: &mut StridedArrayMut<'_, U>,
    src: &StridedArray<'_, T>,
    f: F,
) -> Result<()>
where
    T: Copy,
    F: Fn(T) -> U,
{
    ensure_same_shape(dst.dims(), src.dims())?;

    let dst_ptr = dst.ptr();
    let src_ptr = src.ptr();
    let strides_list = [dst.strides(), src.strides()];
    let fused = fuse_dims(dst.dims(), &strides_list);

    traverse(
        &fused,
        &strides_list,
        &[dst.order(), src.order()],
        &[std::mem::size_of::<U>(), std::mem::size_of::<T>()],
        Some(0),
        true,
        |offsets, len, inner| {
            let mut d = unsafe { dst_ptr.offset(offsets[0]) };
            let mut s = unsafe { src_ptr.offset(offsets[1]) };
            for _ in 0..len {
                unsafe {
                    *d = f(*s);
                    d = d.offset(inner[0]);
                    s = s.offset(inner[1]);
                }
            }
            Ok(())
        },
    )
}

/// `dst[i] = f(a[i], b[i])` over the shared logical shape.
pub fn zip_map2_into<T, U, F>(
    dst: &mut StridedArrayMut<'_, U>,
    a: &StridedArray<'_, T>,
    b: &StridedArray<'_, T>,
    f: F,
) -> Result<()>
where
    T: Copy,
    F: Fn(T, T) -> U,
{
    ensure_same_shape(dst.dims(), a.dims())?;
    ensure_same_shape(dst.dims(), b.dims())?;

    let dst_ptr = dst.ptr();
    let a_ptr = a.ptr();
    let b_ptr = b.ptr();
    let strides_list = [dst.strides(), a.strides(), b.strides()];
    let fused = fuse_dims(dst.dims(), &strides_list);

    traverse(
        &fused,
        &strides_list,
        &[dst.order(), a.order(), b.order()],
        &[
            std::mem::size_of::<U>(),
            std::mem::size_of::<T>(),
            std::mem::size_of::<T>(),
        ],
        Some(0),
        true,
        |offsets, len, inner| {
            let mut d = unsafe { dst_ptr.offset(offsets[0]) };
            let mut pa = unsafe { a_ptr.offset(offsets[1]) };
            let mut pb = unsafe { b_ptr.offset(offsets[2]) };
            for _ in 0..len {
                unsafe {
                    *d = f(*pa, *pb);
                    d = d.offset(inner[0]);
                    pa = pa.offset(inner[1]);
                    pb = pb.offset(inner[2]);
                }
            }
            Ok(())
        },
    )
}

/// `dst[i] = f(a[i], b[i], c[i])` over the shared logical shape.
pub fn zip_map3_into<T, U, F>(
    dst: &mut StridedArrayMut<'_, U>,
    a: &StridedArray<'_, T>,
    b: &StridedArray<'_, T>,
    c: &StridedArray<'_, T>,
    f: F,
) -> Result<()>
where
    T: Copy,
    F: Fn(T, T, T) -> U,
{
    ensure_same_shape(dst.dims(), a.dims())?;
    ensure_same_shape(dst.dims(), b.dims())?;
    ensure_same_shape(dst.dims(), c.dims())?;

    let dst_ptr = dst.ptr();
    let a_ptr = a.ptr();
    let b_ptr = b.ptr();
    let c_ptr = c.ptr();
    let strides_list = [dst.strides(), a.strides(), b.strides(), c.strides()];
    let fused = fuse_dims(dst.dims(), &strides_list);

    traverse(
        &fused,
        &strides_list,
        &[dst.order(), a.order(), b.order(), c.order()],
        &[
            std::mem::size_of::<U>(),
            std::mem::size_of::<T>(),
            std::mem::size_of::<T>(),
            std::mem::size_of::<T>(),
        ],
        Some(0),
        true,
        |offsets, len, inner| {
            let mut d = unsafe { dst_ptr.offset(offsets[0]) };
            let mut pa = unsafe { a_ptr.offset(offsets[1]) };
            let mut pb = unsafe { b_ptr.offset(offsets[2]) };
            let mut pc = unsafe { c_ptr.offset(offsets[3]) };
            for _ in 0..len {
                unsafe {
                    *d = f(*pa, *pb, *pc);
                    d = d.offset(inner[0]);
                    pa = pa.offset(inner[1]);
                    pb = pb.offset(inner[2]);
                    pc = pc.offset(inner[3]);
                }
            }
            Ok(())
        },
    )
}

/// Store `value` into every addressed element of `dst`.
pub fn fill<T>(dst: &mut StridedArrayMut<'_, T>, value: T) -> Result<()>
where
    T: Copy,
{
    let dst_ptr = dst.ptr();
    let strides_list = [dst.strides()];
    let fused = fuse_dims(dst.dims(), &strides_list);

    traverse(
        &fused,
        &strides_list,
        &[dst.order()],
        &[std::mem::size_of::<T>()],
        Some(0),
        true,
        |offsets, len, inner| {
            let mut d = unsafe { dst_ptr.offset(offsets[0]) };
            for _ in 0..len {
                unsafe {
                    *d = value;
                    d = d.offset(inner[0]);
                }
            }
            Ok(())
        },
    )
}
