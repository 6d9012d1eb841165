//! Scaled-dot-product attention.

use std::time::Instant;
use crate::api::error::KernelResult;
use crate::core::softmax::softmax;
use rustml_tensor::{Float, MatmulBackend, Tensor, TensorError};

fn require_rank3<T: Float>(t: &Tensor<T>) -> KernelResult<()> {
    if t.ndim() != 3 {
        return Err(TensorError::UnsupportedDimension {
            expected: 3,
            got: t.ndim(),
        }
        .into());
    }
    Ok(())
}

/// `softmax(Q K^T / sqrt(head_dim) + mask) V`, computed head by head.
///
/// - `q`: `[heads, seq, head_dim]`
/// - `k`: `[heads, kv_len, head_dim]`
/// - `v`: `[heads, kv_len, v_dim]`
/// - `mask`: `seq * kv_len` booleans (e.g. `[1, seq, kv_len]` from
///   [`create_attention_mask`](crate::create_attention_mask)), shared by all
///   heads; `false` entries are excluded.
///
/// Returns `[heads, seq, v_dim]`. A query row with every key masked yields zeros.
pub fn scaled_dot_product_attention<T: Float>(
    q: &Tensor<T>,
    k: &Tensor<T>,
    v: &Tensor<T>,
    mask: Option<&Tensor<bool>>,
    backend: MatmulBackend,
) -> KernelResult<Tensor<T>> {
    let _t = if log::log_enabled!(log::Level::Debug) { Some(Instant::now()) } else { None };

    require_rank3(q)?;
    require_rank3(k)?;
    require_rank3(v)?;

    let (heads, seq, head_dim) = (q.shape()[0], q.shape()[1], q.shape()[2]);
    let kv_len = k.shape()[1];
    let v_dim = v.shape()[2];
    if k.shape()[0] != heads || k.shape()[2] != head_dim {
        return Err(TensorError::ShapeMismatch {
            expected: vec![heads, kv_len, head_dim],
            got: k.shape().to_vec(),
        }
        .into());
    }
    if v.shape()[0] != heads || v.shape()[1] != kv_len {
        return Err(TensorError::ShapeMismatch {
            expected: vec![heads, kv_len, v_dim],
            got: v.shape().to_vec(),
        }
        .into());
    }
    if let Some(m) = mask {
        if m.numel() != seq * kv_len {
            return Err(TensorError::ShapeMismatch {
                expected: vec![1, seq, kv_len],
                got: m.shape().to_vec(),
            }
            .into());
        }
    }

    let scale = T::ONE / T::from_usize(head_dim.max(1)).sqrt();
    let mut out = Tensor::<T>::zeros([heads, seq, v_dim])?;
    let head_size = seq * v_dim;

    for h in 0..heads {
        let q_h = q.select(0, h)?;
        let mut k_t = k.select(0, h)?;
        k_t.transpose()?;
        let v_h = v.select(0, h)?;

        let mut scores = backend.matmul(&q_h, &k_t)?;
        scores.mul_scalar(scale);

        if let Some(m) = mask {
            for (s, &visible) in scores.data_mut().iter_mut().zip(m.iter()) {
                if !visible {
                    *s = T::NEG_INFINITY;
                }
            }
        }

        softmax(&mut scores, -1)?;

        let head_out = backend.matmul(&scores, &v_h)?;
        out.data_mut()[h * head_size..(h + 1) * head_size].copy_from_slice(head_out.data());
    }

    if let Some(t) = _t {
        log::debug!(
            "[perf] attention::sdpa heads={} seq={} kv={} {:.3}ms",
            heads,
            seq,
            kv_len,
            t.elapsed().as_secs_f64() * 1000.0
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mask::create_attention_mask;

    #[test]
    fn test_single_key_returns_value() {
        let q = Tensor::from_vec(vec![1.0f32, 0.0], [1, 1, 2]).unwrap();
        let k = Tensor::from_vec(vec![0.5f32, 0.5], [1, 1, 2]).unwrap();
        let v = Tensor::from_vec(vec![3.0f32, -1.0, 2.0], [1, 1, 3]).unwrap();
        let out = scaled_dot_product_attention(&q, &k, &v, None, MatmulBackend::Reference).unwrap();
        assert_eq!(out.shape(), &[1, 1, 3]);
        assert_eq!(out.data(), &[3.0, -1.0, 2.0]);
    }

    #[test]
    fn test_equal_scores_average_values() {
        let q = Tensor::from_vec(vec![0.0f64; 2], [1, 1, 2]).unwrap();
        let k = Tensor::from_vec(vec![1.0f64, 2.0, 3.0, 4.0], [1, 2, 2]).unwrap();
        let v = Tensor::from_vec(vec![2.0f64, 4.0], [1, 2, 1]).unwrap();
        let out = scaled_dot_product_attention(&q, &k, &v, None, MatmulBackend::Accelerated).unwrap();
        assert!((out.data()[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_causal_mask_first_row_sees_only_itself() {
        let q = Tensor::<f32>::randn([2, 3, 4]).unwrap();
        let k = Tensor::<f32>::randn([2, 3, 4]).unwrap();
        let v = Tensor::from_vec((0..18).map(|i| i as f32).collect(), [2, 3, 3]).unwrap();
        let mask = create_attention_mask(0, 3).unwrap();
        let out = scaled_dot_product_attention(&q, &k, &v, Some(&mask), MatmulBackend::Reference).unwrap();
        // query 0 of each head can only attend to key 0
        for h in 0..2 {
            for d in 0..3 {
                let got = out.get(&[h, 0, d]).unwrap();
                let want = v.get(&[h, 0, d]).unwrap();
                assert!((got - want).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_fully_masked_row_is_zero() {
        let q = Tensor::<f32>::ones([1, 1, 2]).unwrap();
        let k = Tensor::<f32>::ones([1, 2, 2]).unwrap();
        let v = Tensor::<f32>::ones([1, 2, 2]).unwrap();
        let mask = Tensor::<bool>::zeros([1, 1, 2]).unwrap();
        let out = scaled_dot_product_attention(&q, &k, &v, Some(&mask), MatmulBackend::Reference).unwrap();
        assert_eq!(out.data(), &[0.0, 0.0]);
    }

    #[test]
    fn test_zero_size_sequences() {
        for backend in [MatmulBackend::Reference, MatmulBackend::Accelerated] {
            // no queries
            let q = Tensor::<f32>::zeros([2, 0, 4]).unwrap();
            let k = Tensor::<f32>::randn([2, 3, 4]).unwrap();
            let v = Tensor::<f32>::randn([2, 3, 5]).unwrap();
            let out = scaled_dot_product_attention(&q, &k, &v, None, backend).unwrap();
            assert_eq!(out.shape(), &[2, 0, 5]);

            // no keys: nothing to attend to, so every output row is zero
            let q = Tensor::<f32>::randn([2, 3, 4]).unwrap();
            let k = Tensor::<f32>::zeros([2, 0, 4]).unwrap();
            let v = Tensor::<f32>::zeros([2, 0, 5]).unwrap();
            let out = scaled_dot_product_attention(&q, &k, &v, None, backend).unwrap();
            assert_eq!(out.shape(), &[2, 3, 5]);
            assert!(out.iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_shape_errors() {
        let q = Tensor::<f32>::zeros([1, 2, 4]).unwrap();
        let k = Tensor::<f32>::zeros([1, 3, 4]).unwrap();
        let v = Tensor::<f32>::zeros([1, 3, 2]).unwrap();
        let q2 = Tensor::<f32>::zeros([2, 4]).unwrap();
        assert!(scaled_dot_product_attention(&q2, &k, &v, None, MatmulBackend::Reference).is_err());

        let bad_v = Tensor::<f32>::zeros([1, 2, 2]).unwrap();
        assert!(scaled_dot_product_attention(&q, &k, &bad_v, None, MatmulBackend::Reference).is_err());

        let bad_mask = Tensor::<bool>::zeros([1, 2, 2]).unwrap();
        assert!(
            scaled_dot_product_attention(&q, &k, &v, Some(&bad_mask), MatmulBackend::Reference).is_err()
        );
        assert!(scaled_dot_product_attention(&q, &k, &v, None, MatmulBackend::Reference).is_ok());
    }
}
