//! Shape transforms: transpose, flatten, chunk, concat, stack.
//!
//! Each transform derives strides from the current shape on entry and
//! copies element by element through coordinate arithmetic. In-place
//! transforms assemble the complete replacement first and swap it in with
//! [`Tensor::replace`].

use crate::api::error::{TensorError, TensorResult};
use crate::api::types::Element;
use crate::core::coords::{self, normalize_axis, TensorShape};
use crate::core::scratch::CoordScratch;
use super::tensor::{alloc_filled, alloc_vec, Tensor};

impl<T: Element> Tensor<T> {
    // ==================== Transpose ====================

    /// Transpose a 2D tensor in place.
    pub fn transpose(&mut self) -> TensorResult<()> {
        if self.ndim() != 2 {
            return Err(TensorError::UnsupportedDimension {
                expected: 2,
                got: self.ndim(),
            });
        }
        let rows = self.shape[0];
        let cols = self.shape[1];

        let mut data = alloc_vec(rows * cols)?;
        for j in 0..cols {
            for i in 0..rows {
                data.push(self.data[i * cols + j]);
            }
        }

        self.replace(Tensor::from_parts(data, smallvec::smallvec![cols, rows]));
        Ok(())
    }

    /// Swap axes `dim0` and `dim1` in place, moving the data to match.
    pub fn transpose_axes(&mut self, dim0: usize, dim1: usize) -> TensorResult<()> {
        let ndim = self.ndim();
        for dim in [dim0, dim1] {
            if dim >= ndim {
                return Err(TensorError::InvalidDimension {
                    dim: dim as i64,
                    ndim,
                });
            }
        }

        let mut new_shape = self.shape.clone();
        new_shape.swap(dim0, dim1);

        let n = self.numel();
        let mut data = alloc_vec(n)?;
        let mut scratch = CoordScratch::new(&new_shape, &self.shape);
        for i in 0..n {
            let src = scratch.map_index(i, |c, m| {
                m.extend_from_slice(c);
                m.swap(dim0, dim1);
            });
            data.push(self.data[src]);
        }

        self.replace(Tensor::from_parts(data, new_shape));
        Ok(())
    }

    // ==================== Flatten ====================

    /// Collapse axes `start..=end` into one axis. Negative axes count from the end.
    ///
    /// Contiguous row-major axes flatten without moving data; only the shape
    /// changes.
    pub fn flatten(&mut self, start: i64, end: i64) -> TensorResult<()> {
        let ndim = self.ndim();
        let start = normalize_axis(start, ndim)?;
        let end = normalize_axis(end, ndim)?;
        if start > end {
            return Err(TensorError::InvalidDimRange { start, end });
        }

        let collapsed: usize = self.shape[start..=end].iter().product();
        let mut new_shape = TensorShape::with_capacity(ndim - (end - start));
        new_shape.extend_from_slice(&self.shape[..start]);
        new_shape.push(collapsed);
        new_shape.extend_from_slice(&self.shape[end + 1..]);

        self.shape = new_shape;
        Ok(())
    }

    // ==================== Chunk ====================

    /// Split axis `dim` into `num_chunks` equal pieces and return piece `chunk_idx`.
    pub fn chunk(&self, dim: usize, chunk_idx: usize, num_chunks: usize) -> TensorResult<Tensor<T>> {
        let ndim = self.ndim();
        if dim >= ndim {
            return Err(TensorError::InvalidDimension {
                dim: dim as i64,
                ndim,
            });
        }
        let dim_size = self.shape[dim];
        if num_chunks == 0 || num_chunks > dim_size {
            return Err(TensorError::InvalidNumChunks { num_chunks, dim_size });
        }
        if chunk_idx >= num_chunks {
            return Err(TensorError::InvalidChunkIndex { chunk_idx, num_chunks });
        }
        if dim_size % num_chunks != 0 {
            return Err(TensorError::UnevenChunkSize { dim_size, num_chunks });
        }

        let chunk_size = dim_size / num_chunks;
        let start = chunk_idx * chunk_size;

        let mut new_shape = self.shape.clone();
        new_shape[dim] = chunk_size;
        let n = coords::numel(&new_shape);

        let mut data = alloc_vec(n)?;
        let mut scratch = CoordScratch::new(&new_shape, &self.shape);
        for i in 0..n {
            let src = scratch.map_index(i, |c, m| {
                m.extend_from_slice(c);
                m[dim] += start;
            });
            data.push(self.data[src]);
        }

        Ok(Tensor::from_parts(data, new_shape))
    }

    // ==================== Concat ====================

    /// Concatenate `self` and `other` along `dim`.
    pub fn concat(&self, other: &Tensor<T>, dim: usize) -> TensorResult<Tensor<T>> {
        let ndim = self.ndim();
        if other.ndim() != ndim {
            return Err(TensorError::DimensionMismatch {
                lhs: ndim,
                rhs: other.ndim(),
            });
        }
        if dim >= ndim {
            return Err(TensorError::InvalidDimension {
                dim: dim as i64,
                ndim,
            });
        }
        for i in 0..ndim {
            if i != dim && self.shape[i] != other.shape[i] {
                return Err(TensorError::IncompatibleShapes {
                    dim: i,
                    lhs: self.shape.to_vec(),
                    rhs: other.shape.to_vec(),
                });
            }
        }

        let mut new_shape = self.shape.clone();
        new_shape[dim] = self.shape[dim] + other.shape[dim];
        let n = coords::numel(&new_shape);
        if n == 0 {
            return Ok(Tensor::from_parts(Vec::new(), new_shape));
        }

        let mut data = alloc_filled(n, T::default())?;

        let mut scratch = CoordScratch::new(&self.shape, &new_shape);
        for (i, &v) in self.data.iter().enumerate() {
            let dst = scratch.map_index(i, |c, m| m.extend_from_slice(c));
            data[dst] = v;
        }

        let offset = self.shape[dim];
        let mut scratch = CoordScratch::new(&other.shape, &new_shape);
        for (i, &v) in other.data.iter().enumerate() {
            let dst = scratch.map_index(i, |c, m| {
                m.extend_from_slice(c);
                m[dim] += offset;
            });
            data[dst] = v;
        }

        Ok(Tensor::from_parts(data, new_shape))
    }

    // ==================== Stack ====================

    /// Stack equal-shape tensors along a new axis inserted at `dim`.
    ///
    /// `dim` may equal the input rank, which appends the new axis last.
    pub fn stack(tensors: &[Tensor<T>], dim: usize) -> TensorResult<Tensor<T>> {
        let first = tensors.first().ok_or(TensorError::EmptyTensorList)?;
        for t in &tensors[1..] {
            if t.shape != first.shape {
                return Err(TensorError::ShapeMismatch {
                    expected: first.shape.to_vec(),
                    got: t.shape.to_vec(),
                });
            }
        }
        let ndim = first.ndim();
        if dim > ndim {
            return Err(TensorError::InvalidDimension {
                dim: dim as i64,
                ndim,
            });
        }

        let mut new_shape = first.shape.clone();
        new_shape.insert(dim, tensors.len());
        let n = coords::numel(&new_shape);
        let mut data = alloc_filled(n, T::default())?;

        let mut scratch = CoordScratch::new(&first.shape, &new_shape);
        for (slab, t) in tensors.iter().enumerate() {
            for (i, &v) in t.data.iter().enumerate() {
                let dst = scratch.map_index(i, |c, m| {
                    m.extend_from_slice(&c[..dim]);
                    m.push(slab);
                    m.extend_from_slice(&c[dim..]);
                });
                data[dst] = v;
            }
        }

        Ok(Tensor::from_parts(data, new_shape))
    }
}
