use crate::view::{DimVec, MemoryOrder};

/// Permutation of dimension indices, innermost first: `perm[0]` is the
/// dimension the innermost loop walks.
pub(crate) fn loop_order(
    dims: &[usize],
    strides_list: &[&[isize]],
    dest_index: Option<usize>,
    tie_break: MemoryOrder,
) -> DimVec {
    let rank = dims.len();
    let mut perm: DimVec = (0..rank).collect();
    perm.sort_by(|&a, &b| {
        let score_a = dim_score(a, dims, strides_list, dest_index);
        let score_b = dim_score(b, dims, strides_list, dest_index);
        score_a.cmp(&score_b).then_with(|| match tie_break {
            // Row-major treats the later dimension as nominally innermost.
            MemoryOrder::RowMajor => b.cmp(&a),
            MemoryOrder::ColMajor => a.cmp(&b),
        })
    });
    perm
}

/// Weighted stride magnitude of one dimension across all arrays; the
/// destination counts double. Singleton dimensions never iterate, so they
/// score maximally and end up outermost.
fn dim_score(
    dim: usize,
    dims: &[usize],
    strides_list: &[&[isize]],
    dest_index: Option<usize>,
) -> usize {
    if dims[dim] <= 1 {
        return usize::MAX;
    }
    let mut score = 0usize;
    for (i, strides) in strides_list.iter().enumerate() {
        let weight = if dest_index == Some(i) { 2 } else { 1 };
        score = score.saturating_add(weight * strides[dim].unsigned_abs());
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_contiguous_keeps_last_innermost() {
        let dims = [2usize, 3, 4];
        let strides = [12isize, 4, 1];
        let list: Vec<&[isize]> = vec![&strides];
        let perm = loop_order(&dims, &list, Some(0), MemoryOrder::RowMajor);
        assert_eq!(perm.as_slice(), &[2, 1, 0]);
    }

    #[test]
    fn test_col_major_contiguous_keeps_first_innermost() {
        let dims = [2usize, 3, 4];
        let strides = [1isize, 2, 6];
        let list: Vec<&[isize]> = vec![&strides];
        let perm = loop_order(&dims, &list, Some(0), MemoryOrder::ColMajor);
        assert_eq!(perm.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_dest_weighted_double() {
        // dest prefers dim 1 innermost, src prefers dim 0; dest wins 2:1.
        let dims = [4usize, 4];
        let dest = [4isize, 1];
        let src = [1isize, 4];
        let list: Vec<&[isize]> = vec![&dest, &src];
        let perm = loop_order(&dims, &list, Some(0), MemoryOrder::RowMajor);
        assert_eq!(perm[0], 1);
    }

    #[test]
    fn test_singleton_dims_pushed_outermost() {
        let dims = [1usize, 5, 1, 3];
        let strides = [100isize, 3, 50, 1];
        let list: Vec<&[isize]> = vec![&strides];
        let perm = loop_order(&dims, &list, Some(0), MemoryOrder::RowMajor);
        assert_eq!(&perm[..2], &[3, 1]);
    }

    #[test]
    fn test_tie_break_follows_declared_order() {
        // All strides equal: row-major puts the last dim innermost,
        // column-major the first.
        let dims = [3usize, 3];
        let strides = [3isize, 3];
        let list: Vec<&[isize]> = vec![&strides];
        let row = loop_order(&dims, &list, Some(0), MemoryOrder::RowMajor);
        let col = loop_order(&dims, &list, Some(0), MemoryOrder::ColMajor);
        assert_eq!(row[0], 1);
        assert_eq!(col[0], 0);
    }

    #[test]
    fn test_negative_strides_score_by_magnitude() {
        let dims = [2usize, 3];
        let strides = [-1isize, -2];
        let list: Vec<&[isize]> = vec![&strides];
        let perm = loop_order(&dims, &list, Some(0), MemoryOrder::RowMajor);
        assert_eq!(perm[0], 0);
    }

    #[test]
    fn test_rank0() {
        let list: Vec<&[isize]> = vec![&[]];
        let perm = loop_order(&[], &list, Some(0), MemoryOrder::RowMajor);
        assert!(perm.is_empty());
    }
}
