//! Row-major coordinate and stride arithmetic.
//!
//! The last dimension varies fastest: `stride[last] = 1` and
//! `stride[i] = stride[i + 1] * shape[i + 1]`.

use crate::api::error::{TensorError, TensorResult};
use smallvec::SmallVec;

/// Shape/stride/coordinate storage: stack-allocated for <= 4 dims.
pub type TensorShape = SmallVec<[usize; 4]>;

/// Row-major strides for `shape`.
pub fn strides(shape: &[usize]) -> TensorShape {
    if shape.is_empty() {
        return SmallVec::new();
    }
    let mut strides: TensorShape = smallvec::smallvec![1usize; shape.len()];
    for i in (0..shape.len() - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Number of elements described by `shape` (1 for a rank-0 shape).
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Like [`numel`], but `None` when the product overflows `usize`.
pub fn checked_numel(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Flat row-major index of `coords` within `shape`.
///
/// `coords.len()` must equal `shape.len()` and every coordinate must be in
/// bounds; callers are responsible for both.
pub fn index_of(shape: &[usize], coords: &[usize]) -> usize {
    debug_assert_eq!(shape.len(), coords.len());
    let mut index = 0;
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        debug_assert!(coords[i] < shape[i]);
        index += coords[i] * stride;
        stride *= shape[i];
    }
    index
}

/// Inverse of [`index_of`]: writes the coordinates of `index` into `out`.
pub fn index_to_coords(shape: &[usize], mut index: usize, out: &mut [usize]) {
    debug_assert_eq!(shape.len(), out.len());
    for i in (0..shape.len()).rev() {
        let dim = shape[i];
        if dim == 0 {
            out[i] = 0;
            continue;
        }
        out[i] = index % dim;
        index /= dim;
    }
}

/// Dot product of coordinates and strides.
pub(crate) fn offset(coords: &[usize], strides: &[usize]) -> usize {
    coords.iter().zip(strides).map(|(c, s)| c * s).sum()
}

/// Normalize a possibly-negative axis (`-1` = last axis) against `rank`.
pub fn normalize_axis(axis: i64, rank: usize) -> TensorResult<usize> {
    let ndim = rank as i64;
    let normalized = if axis < 0 { axis + ndim } else { axis };
    if normalized >= 0 && normalized < ndim {
        Ok(normalized as usize)
    } else {
        Err(TensorError::InvalidDimension { dim: axis, ndim: rank })
    }
}
