//! Batch-axis gather/scatter over `ndarray` arrays.
//!
//! Axis 0 is always the batch axis. These are the two primitives used to
//! split a batch into orientation subsets and to stitch per-subset results
//! back into batch order.
use crate::error::{Error, Result};
use ndarray::{Array, ArrayBase, Axis, Data, DataMut, RemoveAxis};

/// Copy the rows listed in `indices` (in that order) into a new array.
pub fn gather_rows<A, S, D>(arr: &ArrayBase<S, D>, indices: &[usize]) -> Result<Array<A, D>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: RemoveAxis,
{
    let rows = arr.len_of(Axis(0));
    if let Some(&index) = indices.iter().find(|&&i| i >= rows) {
        return Err(Error::RowOutOfBounds { index, rows });
    }
    Ok(arr.select(Axis(0), indices))
}

/// Write row `k` of `src` into row `indices[k]` of `dst`.
pub fn scatter_rows<A, S, T, D>(
    dst: &mut ArrayBase<S, D>,
    indices: &[usize],
    src: &ArrayBase<T, D>,
) -> Result<()>
where
    A: Clone,
    S: DataMut<Elem = A>,
    T: Data<Elem = A>,
    D: RemoveAxis,
{
    let src_rows = src.len_of(Axis(0));
    if indices.len() != src_rows {
        return Err(Error::RowCountMismatch {
            indices: indices.len(),
            rows: src_rows,
        });
    }
    if dst.shape()[1..] != src.shape()[1..] {
        return Err(Error::RowShapeMismatch {
            expected: dst.shape()[1..].to_vec(),
            found: src.shape()[1..].to_vec(),
        });
    }
    let dst_rows = dst.len_of(Axis(0));
    for (row, &i) in src.axis_iter(Axis(0)).zip(indices) {
        if i >= dst_rows {
            return Err(Error::RowOutOfBounds {
                index: i,
                rows: dst_rows,
            });
        }
        dst.index_axis_mut(Axis(0), i).assign(&row);
    }
    Ok(())
}
