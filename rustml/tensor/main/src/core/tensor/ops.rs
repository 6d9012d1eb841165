//! Element-wise and broadcasting arithmetic.
//!
//! Every operation here mutates the left operand in place. Shape checks run
//! before the first write, so a failed call leaves the tensor unchanged.

use crate::api::error::{TensorError, TensorResult};
use crate::api::types::Numeric;
use crate::core::coords::{self, TensorShape};
use super::tensor::Tensor;

/// Check that `small` right-aligns onto `large`: every trailing axis of
/// `small` either matches `large` or has size 1.
fn check_broadcast(small: &[usize], large: &[usize]) -> TensorResult<()> {
    if small.len() > large.len() {
        return Err(TensorError::InvalidBroadcast {
            from: small.to_vec(),
            to: large.to_vec(),
        });
    }
    let offset = large.len() - small.len();
    for (i, &s) in small.iter().enumerate() {
        if s != 1 && s != large[offset + i] {
            return Err(TensorError::IncompatibleBroadcast {
                from: small.to_vec(),
                to: large.to_vec(),
            });
        }
    }
    Ok(())
}

impl<T: Numeric> Tensor<T> {
    // ==================== Element-wise binary ops ====================

    fn require_same_shape(&self, other: &Tensor<T>) -> TensorResult<()> {
        if self.shape != other.shape {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.to_vec(),
                got: other.shape.to_vec(),
            });
        }
        Ok(())
    }

    /// Element-wise `self += other`. Shapes must be identical.
    pub fn add(&mut self, other: &Tensor<T>) -> TensorResult<()> {
        self.require_same_shape(other)?;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = *a + b;
        }
        Ok(())
    }

    /// Element-wise `self -= other`. Shapes must be identical.
    pub fn sub(&mut self, other: &Tensor<T>) -> TensorResult<()> {
        self.require_same_shape(other)?;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = *a - b;
        }
        Ok(())
    }

    /// Element-wise `self *= other`. Shapes must be identical.
    pub fn mul(&mut self, other: &Tensor<T>) -> TensorResult<()> {
        self.require_same_shape(other)?;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = *a * b;
        }
        Ok(())
    }

    // ==================== Scalar ops ====================

    /// Add `scalar` to every element.
    pub fn add_scalar(&mut self, scalar: T) {
        for a in self.data.iter_mut() {
            *a = *a + scalar;
        }
    }

    /// Multiply every element by `scalar`.
    pub fn mul_scalar(&mut self, scalar: T) {
        for a in self.data.iter_mut() {
            *a = *a * scalar;
        }
    }

    // ==================== Broadcasting ====================

    /// NumPy-style broadcast add: `other` is right-aligned against `self` and
    /// replicated along missing or size-1 axes.
    ///
    /// `self` is the larger operand and keeps its shape.
    pub fn broadcast_add(&mut self, other: &Tensor<T>) -> TensorResult<()> {
        check_broadcast(&other.shape, &self.shape)?;

        // [seq, dim] + [dim]
        if self.ndim() == 2 && other.ndim() == 1 && other.shape[0] == self.shape[1] {
            let dim = self.shape[1];
            if dim == 0 {
                return Ok(());
            }
            for row in self.data.chunks_exact_mut(dim) {
                for (a, &b) in row.iter_mut().zip(other.data.iter()) {
                    *a = *a + b;
                }
            }
            return Ok(());
        }

        let offset = self.ndim() - other.ndim();
        let other_strides = coords::strides(&other.shape);
        let mut out_coords: TensorShape = smallvec::smallvec![0usize; self.ndim()];
        for i in 0..self.data.len() {
            coords::index_to_coords(&self.shape, i, &mut out_coords);
            let mut j = 0;
            for (axis, (&size, &stride)) in other.shape.iter().zip(other_strides.iter()).enumerate() {
                j += (out_coords[offset + axis] % size) * stride;
            }
            self.data[i] = self.data[i] + other.data[j];
        }
        Ok(())
    }

    /// Broadcast multiply treating `other` as a flat buffer that repeats
    /// cyclically: element `i` is multiplied by `other[i % other.numel()]`.
    ///
    /// Unlike [`broadcast_add`](Self::broadcast_add) this ignores shapes. It
    /// agrees with NumPy broadcasting only when `other`'s buffer tiles
    /// `self`'s buffer, e.g. `[..., n] * [n]`.
    pub fn broadcast_mul(&mut self, other: &Tensor<T>) -> TensorResult<()> {
        self.cyclic_apply(other, |a, b| a * b)
    }

    /// Broadcast subtract with the same flat cyclic rule as
    /// [`broadcast_mul`](Self::broadcast_mul).
    pub fn broadcast_sub(&mut self, other: &Tensor<T>) -> TensorResult<()> {
        self.cyclic_apply(other, |a, b| a - b)
    }

    fn cyclic_apply(&mut self, other: &Tensor<T>, op: impl Fn(T, T) -> T) -> TensorResult<()> {
        let n = other.data.len();
        if n == 0 {
            if self.data.is_empty() {
                return Ok(());
            }
            return Err(TensorError::EmptyTensor);
        }
        for (i, a) in self.data.iter_mut().enumerate() {
            *a = op(*a, other.data[i % n]);
        }
        Ok(())
    }
}
