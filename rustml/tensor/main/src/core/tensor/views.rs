//! Storage-level views: reshape, slice, select, squeeze, unsqueeze.
//!
//! Every view here produces an owned, contiguous tensor.

use crate::api::error::{TensorError, TensorResult};
use crate::api::types::Element;
use crate::core::coords::{self, normalize_axis, TensorShape};
use crate::core::scratch::CoordScratch;
use super::tensor::{alloc_vec, Tensor};

impl<T: Element> Tensor<T> {
    // ==================== Reshape ====================

    /// Reshape the tensor, copying its data. The element count must not change.
    pub fn reshape(&self, shape: &[usize]) -> TensorResult<Tensor<T>> {
        self.clone().into_shape(shape)
    }

    /// Reshape without copying, consuming the tensor.
    pub fn into_shape(self, shape: &[usize]) -> TensorResult<Tensor<T>> {
        let new_size = coords::checked_numel(shape);
        if new_size != Some(self.numel()) {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.numel()],
                got: vec![new_size.unwrap_or(usize::MAX)],
            });
        }
        Ok(Tensor::from_parts(self.data, TensorShape::from_slice(shape)))
    }

    // ==================== Unsqueeze / Squeeze ====================

    /// Add a dimension of size 1 at the specified position.
    pub fn unsqueeze(&self, dim: i64) -> TensorResult<Tensor<T>> {
        let ndim = self.ndim() as i64 + 1;
        let normalized = if dim < 0 { dim + ndim } else { dim };
        if normalized < 0 || normalized > self.ndim() as i64 {
            return Err(TensorError::InvalidDimension {
                dim,
                ndim: self.ndim(),
            });
        }
        let mut new_dims = self.shape.clone();
        new_dims.insert(normalized as usize, 1);
        self.reshape(&new_dims)
    }

    /// Remove a dimension of size 1.
    pub fn squeeze(&self, dim: i64) -> TensorResult<Tensor<T>> {
        let dim_idx = normalize_axis(dim, self.ndim())?;
        if self.shape[dim_idx] != 1 {
            return Err(TensorError::InvalidOperation(format!(
                "Cannot squeeze dimension {} with size {}",
                dim, self.shape[dim_idx]
            )));
        }
        let mut new_dims = self.shape.clone();
        new_dims.remove(dim_idx);
        self.reshape(&new_dims)
    }

    // ==================== Slice ====================

    /// Copy the half-open range `start..end` of axis `dim`; other axes are kept whole.
    pub fn slice(&self, dim: i64, start: usize, end: usize) -> TensorResult<Tensor<T>> {
        let dim_idx = normalize_axis(dim, self.ndim())?;
        let dim_size = self.shape[dim_idx];

        if start > end || end > dim_size {
            return Err(TensorError::InvalidSliceRange {
                start,
                end,
                size: dim_size,
            });
        }

        let mut new_shape = self.shape.clone();
        new_shape[dim_idx] = end - start;
        let n = coords::numel(&new_shape);
        let mut data = alloc_vec(n)?;

        // Whole rows of the trailing axes are contiguous in both layouts.
        let inner: usize = self.shape[dim_idx + 1..].iter().product();
        let outer: usize = self.shape[..dim_idx].iter().product();
        for o in 0..outer {
            let base = o * dim_size * inner;
            data.extend_from_slice(&self.data[base + start * inner..base + end * inner]);
        }

        Ok(Tensor::from_parts(data, new_shape))
    }

    // ==================== Select ====================

    /// Select a single index along a dimension (reduces dimensionality).
    pub fn select(&self, dim: i64, index: usize) -> TensorResult<Tensor<T>> {
        let dim_idx = normalize_axis(dim, self.ndim())?;
        let dim_size = self.shape[dim_idx];
        if index >= dim_size {
            return Err(TensorError::IndexOutOfBounds {
                dim: dim_idx,
                index,
                size: dim_size,
            });
        }

        let mut new_shape = self.shape.clone();
        new_shape.remove(dim_idx);
        let n = coords::numel(&new_shape);
        let mut data = alloc_vec(n)?;

        let mut scratch = CoordScratch::new(&new_shape, &self.shape);
        for i in 0..n {
            let src = scratch.map_index(i, |c, m| {
                m.extend_from_slice(&c[..dim_idx]);
                m.push(index);
                m.extend_from_slice(&c[dim_idx..]);
            });
            data.push(self.data[src]);
        }

        Ok(Tensor::from_parts(data, new_shape))
    }
}
