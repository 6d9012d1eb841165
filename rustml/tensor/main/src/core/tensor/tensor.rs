//! Owned, contiguous, row-major tensor storage generic over the element type.

use crate::api::error::{TensorError, TensorResult};
use crate::api::types::{DType, Element, Float, Numeric};
use crate::core::coords::{self, TensorShape};
use rand::Rng;
use std::fmt;

/// Allocate a buffer of `len` copies of `value`, reporting allocation failure
/// as `OutOfMemory` instead of aborting.
pub(crate) fn alloc_filled<T: Element>(len: usize, value: T) -> TensorResult<Vec<T>> {
    let mut buf = alloc_vec(len)?;
    buf.resize(len, value);
    Ok(buf)
}

/// Element count of `shape`; a count past `usize::MAX` can never be allocated.
pub(crate) fn alloc_len(shape: &[usize]) -> TensorResult<usize> {
    coords::checked_numel(shape).ok_or(TensorError::OutOfMemory { bytes: usize::MAX })
}

/// Allocate an empty buffer with room for `len` elements.
pub(crate) fn alloc_vec<T: Element>(len: usize) -> TensorResult<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| TensorError::OutOfMemory {
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    Ok(buf)
}

/// A dense N-dimensional tensor.
///
/// `data.len() == product(shape)` holds for every tensor handed out by this
/// crate. Shape and data are only ever replaced together, through
/// [`Tensor::replace`].
#[derive(Clone, PartialEq)]
pub struct Tensor<T: Element> {
    pub(crate) data: Vec<T>,
    pub(crate) shape: TensorShape,
}

impl<T: Element> Tensor<T> {
    // ==================== Constructors ====================

    /// Create a tensor from a data vector and a shape.
    pub fn from_vec(data: Vec<T>, shape: impl AsRef<[usize]>) -> TensorResult<Self> {
        let shape = shape.as_ref();
        if coords::checked_numel(shape) != Some(data.len()) {
            return Err(TensorError::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self {
            data,
            shape: TensorShape::from_slice(shape),
        })
    }

    /// Assemble a tensor whose invariant the caller has already established.
    pub(crate) fn from_parts(data: Vec<T>, shape: TensorShape) -> Self {
        debug_assert_eq!(data.len(), coords::numel(&shape));
        Self { data, shape }
    }

    /// Create a tensor filled with `value`.
    pub fn full(shape: impl AsRef<[usize]>, value: T) -> TensorResult<Self> {
        let shape = shape.as_ref();
        let data = alloc_filled(alloc_len(shape)?, value)?;
        Ok(Self::from_parts(data, TensorShape::from_slice(shape)))
    }

    /// Create a tensor filled with the element type's default value
    /// (zero for numbers, `false` for masks).
    pub fn zeros(shape: impl AsRef<[usize]>) -> TensorResult<Self> {
        Self::full(shape, T::default())
    }

    /// Create a rank-0 tensor holding a single value.
    pub fn scalar(value: T) -> Self {
        Self::from_parts(vec![value], TensorShape::new())
    }

    // ==================== Properties ====================

    /// Get the shape as a slice.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Size of axis `axis`.
    pub fn dim(&self, axis: usize) -> TensorResult<usize> {
        self.shape.get(axis).copied().ok_or(TensorError::InvalidDimension {
            dim: axis as i64,
            ndim: self.ndim(),
        })
    }

    /// Get the total number of elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the dtype.
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Row-major strides derived from the current shape.
    pub fn strides(&self) -> TensorShape {
        coords::strides(&self.shape)
    }

    /// The flat element buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the flat element buffer. The length cannot change.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Copy the elements out into a vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    /// Iterate over all elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Consume the tensor, returning its buffer and shape.
    pub fn into_parts(self) -> (Vec<T>, TensorShape) {
        (self.data, self.shape)
    }

    /// Replace shape and data together with those of `next`.
    ///
    /// `next` is fully built before this is called, so no other code can
    /// observe a shape that disagrees with the buffer. The previous
    /// allocations are released here.
    pub fn replace(&mut self, next: Tensor<T>) {
        *self = next;
    }

    // ==================== Indexing ====================

    /// Get a single element by coordinates.
    pub fn get(&self, indices: &[usize]) -> TensorResult<T> {
        let offset = self.checked_offset(indices)?;
        Ok(self.data[offset])
    }

    /// Set a single element by coordinates.
    pub fn set(&mut self, indices: &[usize], value: T) -> TensorResult<()> {
        let offset = self.checked_offset(indices)?;
        self.data[offset] = value;
        Ok(())
    }

    fn checked_offset(&self, indices: &[usize]) -> TensorResult<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::InvalidOperation(format!(
                "Expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }
        for (i, (&idx, &size)) in indices.iter().zip(self.shape.iter()).enumerate() {
            if idx >= size {
                return Err(TensorError::IndexOutOfBounds {
                    dim: i,
                    index: idx,
                    size,
                });
            }
        }
        Ok(coords::index_of(&self.shape, indices))
    }
}

impl<T: Numeric> Tensor<T> {
    /// Create a tensor filled with ones.
    pub fn ones(shape: impl AsRef<[usize]>) -> TensorResult<Self> {
        Self::full(shape, T::ONE)
    }

    /// Create a 1D tensor `[0, 1, ..., n - 1]`.
    pub fn arange(n: usize) -> TensorResult<Self> {
        let mut data = alloc_vec(n)?;
        data.extend((0..n).map(T::from_usize));
        Ok(Self::from_parts(data, smallvec::smallvec![n]))
    }

    /// Create an identity matrix.
    pub fn eye(n: usize) -> TensorResult<Self> {
        let len = n.checked_mul(n).ok_or(TensorError::OutOfMemory { bytes: usize::MAX })?;
        let mut data = alloc_filled(len, T::ZERO)?;
        for i in 0..n {
            data[i * n + i] = T::ONE;
        }
        Ok(Self::from_parts(data, smallvec::smallvec![n, n]))
    }
}

impl<T: Float> Tensor<T> {
    /// Create a tensor with random values from the standard normal distribution.
    pub fn randn(shape: impl AsRef<[usize]>) -> TensorResult<Self> {
        let shape = shape.as_ref();
        let n = alloc_len(shape)?;
        let mut rng = rand::thread_rng();
        let mut data = alloc_vec(n)?;
        data.extend((0..n).map(|_| {
            let u1: f64 = rng.r#gen::<f64>().max(1e-12);
            let u2: f64 = rng.r#gen();
            T::from_f64((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos())
        }));
        Ok(Self::from_parts(data, TensorShape::from_slice(shape)))
    }

    /// Create a tensor with random uniform values in [0, 1).
    pub fn rand(shape: impl AsRef<[usize]>) -> TensorResult<Self> {
        let shape = shape.as_ref();
        let n = alloc_len(shape)?;
        let mut rng = rand::thread_rng();
        let mut data = alloc_vec(n)?;
        data.extend((0..n).map(|_| T::from_f64(rng.r#gen::<f64>())));
        Ok(Self::from_parts(data, TensorShape::from_slice(shape)))
    }
}

// ==================== Display ====================

impl<T: Element> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={:?}, dtype={})",
            self.shape.as_slice(),
            T::DTYPE
        )
    }
}

impl<T: Element> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.numel();
        if n <= 100 {
            write!(f, "Tensor({:?}, {:?})", self.shape.as_slice(), self.data)
        } else {
            write!(
                f,
                "Tensor({:?}, [{:?}, {:?}, ..., {:?}, {:?}])",
                self.shape.as_slice(),
                self.data[0],
                self.data[1],
                self.data[n - 2],
                self.data[n - 1],
            )
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_tensor_creation() {
        let t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.numel(), 4);
        assert_eq!(t.dtype(), DType::F32);
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let err = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], [2, 2]).unwrap_err();
        assert_eq!(
            err,
            TensorError::ShapeMismatch {
                expected: vec![2, 2],
                got: vec![3]
            }
        );
    }

    #[test]
    fn test_element_count_overflow_is_out_of_memory() {
        let huge = usize::MAX / 2 + 1;
        assert!(matches!(
            Tensor::<f32>::zeros([huge, 4]),
            Err(TensorError::OutOfMemory { bytes: usize::MAX })
        ));
        assert!(matches!(
            Tensor::<f32>::randn([huge, huge]),
            Err(TensorError::OutOfMemory { .. })
        ));
        assert!(matches!(
            Tensor::<f64>::eye(usize::MAX / 2),
            Err(TensorError::OutOfMemory { .. })
        ));
        assert!(matches!(
            Tensor::from_vec(vec![1.0f32], [huge, 2]),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_zeros_ones() {
        let zeros = Tensor::<f32>::zeros([2, 3]).unwrap();
        assert_eq!(zeros.iter().sum::<f32>(), 0.0);

        let ones = Tensor::<i64>::ones([2, 3]).unwrap();
        assert_eq!(ones.iter().sum::<i64>(), 6);
    }

    #[test]
    fn test_bool_zeros_are_false() {
        let mask = Tensor::<bool>::zeros([1, 2, 2]).unwrap();
        assert!(mask.iter().all(|&m| !m));
        assert_eq!(mask.dtype(), DType::Bool);
    }

    #[test]
    fn test_scalar_has_rank_zero() {
        let s = Tensor::scalar(3.5f64);
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.numel(), 1);
        assert_eq!(s.get(&[]).unwrap(), 3.5);
    }

    #[test]
    fn test_arange_and_eye() {
        let a = Tensor::<f16>::arange(3).unwrap();
        assert_eq!(a.shape(), &[3]);
        assert_eq!(a.data()[2].to_f32(), 2.0);

        let i = Tensor::<i32>::eye(2).unwrap();
        assert_eq!(i.data(), &[1, 0, 0, 1]);
    }

    #[test]
    fn test_get_set() {
        let mut t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        assert_eq!(t.get(&[0, 1]).unwrap(), 2.0);
        assert_eq!(t.get(&[1, 0]).unwrap(), 3.0);
        t.set(&[1, 1], 9.0).unwrap();
        assert_eq!(t.data(), &[1.0, 2.0, 3.0, 9.0]);
        assert!(matches!(
            t.get(&[2, 0]),
            Err(TensorError::IndexOutOfBounds { dim: 0, index: 2, size: 2 })
        ));
        assert!(t.get(&[0]).is_err());
    }

    #[test]
    fn test_dim() {
        let t = Tensor::<f32>::zeros([2, 5]).unwrap();
        assert_eq!(t.dim(1).unwrap(), 5);
        assert!(t.dim(2).is_err());
    }

    #[test]
    fn test_clone_is_deep() {
        let a = Tensor::from_vec(vec![1i32, 2, 3], [3]).unwrap();
        let mut b = a.clone();
        b.data_mut()[0] = 100;
        assert_eq!(a.data(), &[1, 2, 3]);
        assert_eq!(b.data(), &[100, 2, 3]);
    }

    #[test]
    fn test_replace_swaps_shape_and_data() {
        let mut a = Tensor::<f32>::zeros([2, 2]).unwrap();
        let next = Tensor::from_vec(vec![1.0f32; 6], [3, 2]).unwrap();
        a.replace(next);
        assert_eq!(a.shape(), &[3, 2]);
        assert_eq!(a.numel(), 6);
    }

    #[test]
    fn test_randn_shape() {
        let t = Tensor::<f32>::randn([4, 8]).unwrap();
        assert_eq!(t.numel(), 32);
        assert!(t.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_display_small() {
        let t = Tensor::from_vec(vec![1i32, 2], [2]).unwrap();
        assert_eq!(format!("{}", t), "Tensor([2], [1, 2])");
        assert_eq!(format!("{:?}", t), "Tensor(shape=[2], dtype=i32)");
    }
}
