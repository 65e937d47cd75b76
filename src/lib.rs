//! Cache-aware traversal engine for strided n-dimensional array views.
//!
//! This crate is the numeric kernel layer of an ndarray library: it walks one
//! or more strided views that share a logical iteration shape and applies a
//! caller-supplied operation at every element. Views may have arbitrary rank,
//! row- or column-major layout, arbitrary offsets, and negative strides
//! (reversed axes); the engine picks a traversal strategy per call so that
//! hot loops stay cache-friendly without per-rank specialization.
//!
//! # Core Types
//!
//! - [`StridedArray`] / [`StridedArrayMut`]: dynamic-rank strided views over
//!   caller-owned slices
//! - [`MemoryOrder`]: declared layout, used to break loop-order ties when
//!   strides alone are ambiguous
//!
//! # Element-wise Operations
//!
//! - [`map_into`]: unary map from source to destination
//! - [`zip_map2_into`], [`zip_map3_into`]: binary/ternary element-wise maps
//! - [`fill`]: store one value into every addressed element
//!
//! # Reductions
//!
//! - [`reduce`]: full fold over one view
//! - [`reduce_dims_into`]: reduce a set of axes, writing into an output view
//! - [`zip_reduce2_dims_into`]: binary reduction (two co-iterated inputs fed
//!   to a caller-supplied core primitive per retained index)
//!
//! # Copy-family Operations
//!
//! - [`copy_into`], [`conj_into`], [`concat_into`], [`flatten_into`]
//! - [`add_into`], [`mul_into`], [`axpy_into`], [`sum`], [`dot`]
//!
//! # Strategy Selection
//!
//! Every call resolves to exactly one of: scalar (rank 0), a single 1-D run
//! (rank 1, singleton collapse, or contiguity collapse), direct nested loops,
//! blocked (tiled) nested loops, or a linear-index fallback for ranks beyond
//! [`MAX_NESTED_RANK`]. Dimensions are first fused where jointly contiguous,
//! then permuted so the innermost loop walks the smallest weighted stride,
//! and blocked traversals tile every level to fit [`BLOCK_MEMORY_SIZE`].
//!
//! # Example
//!
//! ```rust
//! use strided_engine::{zip_map2_into, MemoryOrder, StridedArray, StridedArrayMut};
//!
//! let a_data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let b_data = vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
//! let mut out_data = vec![0.0; 6];
//!
//! let a = StridedArray::new(&a_data, &[2, 3], &[3, 1], 0, MemoryOrder::RowMajor).unwrap();
//! // b viewed transposed: same logical shape, column-walking strides
//! let b = StridedArray::new(&b_data, &[2, 3], &[1, 2], 0, MemoryOrder::RowMajor).unwrap();
//! let mut out =
//!     StridedArrayMut::new(&mut out_data, &[2, 3], &[3, 1], 0, MemoryOrder::RowMajor).unwrap();
//!
//! zip_map2_into(&mut out, &a, &b, |x, y| x + y).unwrap();
//! assert_eq!(out_data[0], 11.0);
//! ```

mod block;
mod dispatch;
mod engine;
mod fuse;
mod increment;
mod map;
mod ops;
mod order;
mod reduce;
mod reduce_view;
mod view;

pub use map::{fill, map_into, zip_map2_into, zip_map3_into};
pub use ops::{
    add_into, axpy_into, concat_into, conj_into, copy_into, dot, flatten_into, mul_into, sum,
};
pub use reduce::{reduce, reduce_dims_into, zip_reduce2_dims_into};
pub use view::{MemoryOrder, StridedArray, StridedArrayMut};

/// Cache budget in bytes for one tile's working set across all co-iterated
/// arrays (L1 target). The advisor in `block.rs` derives tile edge lengths
/// from this; it is an empirical tuning constant, not a hard limit.
pub const BLOCK_MEMORY_SIZE: usize = 32 * 1024;

/// Largest rank handled by the direct and blocked nested-loop drivers.
/// Beyond this, traversal falls back to linear-index decomposition, which
/// works for any rank at the cost of per-element index arithmetic.
pub const MAX_NESTED_RANK: usize = 10;

/// Errors raised at the validation boundary, before any traversal runs.
#[derive(Debug, thiserror::Error)]
pub enum StridedError {
    /// Co-iterated views have differing numbers of dimensions.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Co-iterated views have equal rank but differing extents.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// A reduction axis index is outside `[0, rank)`.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// The reduction axis list contains a repeated index.
    #[error("duplicate axis {axis}")]
    DuplicateAxis { axis: usize },

    /// Non-reduced dimension extents disagree between input and output.
    #[error("loop dimension mismatch: {0:?} vs {1:?}")]
    LoopDimensionMismatch(Vec<usize>, Vec<usize>),

    /// Output rank does not equal input rank minus the number of reduced axes.
    #[error("output rank mismatch: expected {expected}, got {actual}")]
    OutputRankMismatch { expected: usize, actual: usize },

    /// Stride array length does not match the number of dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// The view would address an element outside its backing slice.
    #[error("view addresses index {index} outside buffer of length {len}")]
    OutOfBounds { index: isize, len: usize },

    /// Integer overflow while computing a buffer offset.
    #[error("offset overflow while computing address")]
    OffsetOverflow,
}

/// Result type for strided operations.
pub type Result<T> = std::result::Result<T, StridedError>;
