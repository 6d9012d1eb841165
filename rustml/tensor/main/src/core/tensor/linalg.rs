//! Matrix multiplication and outer product.
//!
//! Two GEMM paths share one contract (row-major `[m, k] x [k, n] -> [m, n]`):
//! the reference triple loop, usable for every numeric type, and faer for
//! `f32`/`f64`. [`MatmulBackend`] selects between them at the call site.

use crate::api::error::{TensorError, TensorResult};
use crate::api::types::{Float, Numeric};
use serde::Deserialize;
use super::tensor::{alloc_filled, alloc_vec, Tensor};

/// Reference GEMM: `out[i, j] += sum_p a[i, p] * b[p, j]`, all row-major.
pub(crate) fn reference_gemm<T: Numeric>(a: &[T], b: &[T], out: &mut [T], m: usize, k: usize, n: usize) {
    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        let out_row = &mut out[i * n..(i + 1) * n];
        for (p, &a_ip) in a_row.iter().enumerate() {
            let b_row = &b[p * n..(p + 1) * n];
            for (o, &b_pj) in out_row.iter_mut().zip(b_row.iter()) {
                *o = *o + a_ip * b_pj;
            }
        }
    }
}

// faer is column-major: a row-major [m, k] buffer reads as its transpose
// [k, m], so C^T = B^T * A^T lands in `out` as row-major C.
macro_rules! faer_gemm {
    ($name:ident, $ty:ty) => {
        pub(crate) fn $name(a: &[$ty], b: &[$ty], out: &mut [$ty], m: usize, k: usize, n: usize) {
            if m == 0 || k == 0 || n == 0 {
                return;
            }
            let a_t = faer::mat::from_column_major_slice::<$ty, usize, usize>(a, k, m);
            let b_t = faer::mat::from_column_major_slice::<$ty, usize, usize>(b, n, k);
            let mut c_t = faer::mat::from_column_major_slice_mut::<$ty, usize, usize>(out, n, m);
            c_t.copy_from(b_t * a_t);
        }
    };
}

faer_gemm!(gemm_f32, f32);
faer_gemm!(gemm_f64, f64);

/// Validate a 2D product and return `(m, k, n)`.
fn matmul_dims<T: Numeric>(a: &Tensor<T>, b: &Tensor<T>) -> TensorResult<(usize, usize, usize)> {
    for t in [a, b] {
        if t.ndim() != 2 {
            return Err(TensorError::UnsupportedDimension {
                expected: 2,
                got: t.ndim(),
            });
        }
    }
    let (m, k) = (a.shape[0], a.shape[1]);
    let (k2, n) = (b.shape[0], b.shape[1]);
    if k != k2 {
        return Err(TensorError::IncompatibleDimensions { left: k, right: k2 });
    }
    Ok((m, k, n))
}

/// Which GEMM implementation a matmul should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatmulBackend {
    /// The naive triple loop of [`Tensor::matmul`].
    Reference,
    /// faer GEMM for `f32`/`f64`; other float types fall back to the reference loop.
    #[default]
    Accelerated,
}

impl MatmulBackend {
    /// Multiply two 2D tensors. Validation and results match [`Tensor::matmul`].
    pub fn matmul<T: Float>(&self, a: &Tensor<T>, b: &Tensor<T>) -> TensorResult<Tensor<T>> {
        match self {
            MatmulBackend::Reference => a.matmul(b),
            MatmulBackend::Accelerated => {
                let (m, k, n) = matmul_dims(a, b)?;
                let mut out = alloc_filled(m * n, T::ZERO)?;
                T::gemm(&a.data, &b.data, &mut out, m, k, n);
                Ok(Tensor::from_parts(out, smallvec::smallvec![m, n]))
            }
        }
    }
}

impl<T: Numeric> Tensor<T> {
    /// Dense 2D matrix product `[m, k] x [k, n] -> [m, n]` (reference loop).
    pub fn matmul(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        let (m, k, n) = matmul_dims(self, other)?;
        let mut out = alloc_filled(m * n, T::ZERO)?;
        reference_gemm(&self.data, &other.data, &mut out, m, k, n);
        Ok(Tensor::from_parts(out, smallvec::smallvec![m, n]))
    }

    /// Outer product of two 1D tensors: `out[i, j] = self[i] * other[j]`.
    pub fn outer(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        if self.ndim() != 1 || other.ndim() != 1 {
            return Err(TensorError::InvalidDimensions {
                expected: 1,
                lhs: self.ndim(),
                rhs: other.ndim(),
            });
        }
        let (m, n) = (self.data.len(), other.data.len());
        let mut out = alloc_vec(m * n)?;
        for &a in &self.data {
            out.extend(other.data.iter().map(|&b| a * b));
        }
        Ok(Tensor::from_parts(out, smallvec::smallvec![m, n]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::bf16;

    fn m2(data: Vec<f32>, rows: usize, cols: usize) -> Tensor<f32> {
        Tensor::from_vec(data, [rows, cols]).unwrap()
    }

    #[test]
    fn test_matmul_known_product() {
        let a = m2(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = m2(vec![5.0, 6.0, 7.0, 8.0], 2, 2);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_rectangular() {
        // [2, 3] x [3, 1]
        let a = m2(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let b = m2(vec![1.0, 0.0, -1.0], 3, 1);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), &[2, 1]);
        assert_eq!(c.data(), &[-2.0, -2.0]);
    }

    #[test]
    fn test_matmul_integers() {
        let a = Tensor::from_vec(vec![1i32, 2, 3, 4], [2, 2]).unwrap();
        let i = Tensor::<i32>::eye(2).unwrap();
        assert_eq!(a.matmul(&i).unwrap().data(), a.data());
    }

    #[test]
    fn test_matmul_errors() {
        let a = m2(vec![1.0; 6], 2, 3);
        let v = Tensor::from_vec(vec![1.0f32; 3], [3]).unwrap();
        assert_eq!(
            a.matmul(&v),
            Err(TensorError::UnsupportedDimension { expected: 2, got: 1 })
        );
        assert_eq!(
            a.matmul(&a),
            Err(TensorError::IncompatibleDimensions { left: 3, right: 2 })
        );
    }

    #[test]
    fn test_accelerated_matches_reference() {
        let a = Tensor::<f32>::randn([5, 7]).unwrap();
        let b = Tensor::<f32>::randn([7, 3]).unwrap();
        let r = MatmulBackend::Reference.matmul(&a, &b).unwrap();
        let f = MatmulBackend::Accelerated.matmul(&a, &b).unwrap();
        assert_eq!(r.shape(), f.shape());
        for (x, y) in r.iter().zip(f.iter()) {
            assert!((x - y).abs() < 1e-4, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_accelerated_f64_and_half() {
        let a = Tensor::from_vec(vec![1.0f64, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        let b = Tensor::from_vec(vec![5.0f64, 6.0, 7.0, 8.0], [2, 2]).unwrap();
        let c = MatmulBackend::Accelerated.matmul(&a, &b).unwrap();
        assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);

        let ah = Tensor::from_vec(vec![bf16::from_f32(2.0); 4], [2, 2]).unwrap();
        let ch = MatmulBackend::Accelerated.matmul(&ah, &ah).unwrap();
        assert!(ch.iter().all(|v| v.to_f32() == 8.0));
    }

    #[test]
    fn test_accelerated_empty_inner_dim() {
        let a = Tensor::<f32>::zeros([2, 0]).unwrap();
        let b = Tensor::<f32>::zeros([0, 3]).unwrap();
        let c = MatmulBackend::Accelerated.matmul(&a, &b).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        assert!(c.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_backend_deserialize() {
        let b: MatmulBackend = serde_json::from_str("\"reference\"").unwrap();
        assert_eq!(b, MatmulBackend::Reference);
        assert_eq!(MatmulBackend::default(), MatmulBackend::Accelerated);
    }

    #[test]
    fn test_outer() {
        let a = Tensor::from_vec(vec![1.0f32, 2.0], [2]).unwrap();
        let b = Tensor::from_vec(vec![3.0f32, 4.0, 5.0], [3]).unwrap();
        let o = a.outer(&b).unwrap();
        assert_eq!(o.shape(), &[2, 3]);
        assert_eq!(o.data(), &[3.0, 4.0, 5.0, 6.0, 8.0, 10.0]);

        let m = m2(vec![1.0; 4], 2, 2);
        assert_eq!(
            a.outer(&m),
            Err(TensorError::InvalidDimensions { expected: 1, lhs: 1, rhs: 2 })
        );
    }
}
