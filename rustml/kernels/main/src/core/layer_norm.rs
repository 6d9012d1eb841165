//! Layer normalization over the last axis.

use std::time::Instant;
use crate::api::error::{KernelError, KernelResult};
use rustml_tensor::{Float, Tensor};

fn check_param_shape<T: Float>(param: &Tensor<T>, features: usize) -> bool {
    param.ndim() == 1 && param.shape()[0] == features
}

/// Normalize every vector along the last axis of `input`, then scale by
/// `weight` and shift by `bias` (both `[features]`).
///
/// Validation runs in stages: input stability, weight and bias stability,
/// `eps > 0`, input rank, parameter shapes. Statistics accumulate in `f64`
/// with a two-pass (biased) variance. Any non-finite output fails the call.
pub fn layer_norm<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: &Tensor<T>,
    eps: T,
) -> KernelResult<Tensor<T>> {
    let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };

    input.check_stability()?;
    weight.check_stability()?;
    bias.check_stability()?;

    let eps_f = eps.to_f64();
    if !(eps_f > 0.0) {
        return Err(KernelError::InvalidEpsilon { eps: eps_f });
    }
    if input.ndim() == 0 {
        return Err(KernelError::InvalidShape {
            shape: input.shape().to_vec(),
        });
    }

    let features = input.shape()[input.ndim() - 1];
    if !check_param_shape(weight, features) {
        return Err(KernelError::InvalidWeightShape {
            expected: features,
            got: weight.shape().to_vec(),
        });
    }
    if !check_param_shape(bias, features) {
        return Err(KernelError::InvalidBiasShape {
            expected: features,
            got: bias.shape().to_vec(),
        });
    }

    let mut out = input.clone();
    if features == 0 {
        return Ok(out);
    }

    let w = weight.data();
    let b = bias.data();
    let n = features as f64;
    for (row, chunk) in out.data_mut().chunks_exact_mut(features).enumerate() {
        let mean = chunk.iter().map(|v| v.to_f64()).sum::<f64>() / n;
        let variance = chunk
            .iter()
            .map(|v| {
                let d = v.to_f64() - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        if variance < -eps_f {
            log::warn!("layer_norm: negative variance {} in row {}", variance, row);
            return Err(KernelError::NegativeVariance { variance, row });
        }
        let std = (variance + eps_f).sqrt();
        if std == 0.0 {
            return Err(KernelError::ZeroStandardDeviation { row });
        }

        for (j, v) in chunk.iter_mut().enumerate() {
            let normalized = (v.to_f64() - mean) / std;
            let y = T::from_f64(normalized) * w[j] + b[j];
            if y.is_nan() {
                log::warn!("layer_norm: NaN at row {} feature {}", row, j);
                return Err(KernelError::ComputedNaN { index: row * features + j });
            }
            if !y.is_finite() {
                log::warn!("layer_norm: infinity at row {} feature {}", row, j);
                return Err(KernelError::ComputedInfinity { index: row * features + j });
            }
            *v = y;
        }
    }

    out.check_stability()?;

    if let Some(t) = _t {
        log::trace!("[perf] layer_norm {:?} {:.3}ms", input.shape(), t.elapsed().as_secs_f64() * 1000.0);
    }
    Ok(out)
}

/// Layer normalization with learned scale and shift.
#[derive(Debug, Clone)]
pub struct LayerNorm<T: Float> {
    pub weight: Tensor<T>,
    pub bias: Tensor<T>,
    pub eps: T,
}

impl<T: Float> LayerNorm<T> {
    /// Identity-initialized layer: weight ones, bias zeros.
    pub fn new(features: usize, eps: T) -> KernelResult<Self> {
        Ok(Self {
            weight: Tensor::ones([features])?,
            bias: Tensor::zeros([features])?,
            eps,
        })
    }

    /// Construct a LayerNorm from pre-loaded weight and bias tensors.
    pub fn from_weights(weight: Tensor<T>, bias: Tensor<T>, eps: T) -> KernelResult<Self> {
        let features = weight.shape().first().copied().unwrap_or(0);
        if !check_param_shape(&weight, features) {
            return Err(KernelError::InvalidWeightShape {
                expected: features,
                got: weight.shape().to_vec(),
            });
        }
        if !check_param_shape(&bias, features) {
            return Err(KernelError::InvalidBiasShape {
                expected: features,
                got: bias.shape().to_vec(),
            });
        }
        Ok(Self { weight, bias, eps })
    }

    pub fn features(&self) -> usize {
        self.weight.numel()
    }

    pub fn forward(&self, input: &Tensor<T>) -> KernelResult<Tensor<T>> {
        layer_norm(input, &self.weight, &self.bias, self.eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustml_tensor::TensorError;

    fn vec1(data: &[f32]) -> Tensor<f32> {
        Tensor::from_vec(data.to_vec(), [data.len()]).unwrap()
    }

    #[test]
    fn test_layer_norm_basic() {
        let x = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [1, 4]).unwrap();
        let ln = LayerNorm::new(4, 1e-5f32).unwrap();
        let y = ln.forward(&x).unwrap();
        let mean: f32 = y.iter().sum::<f32>() / 4.0;
        let var: f32 = y.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / 4.0;
        assert!(mean.abs() < 1e-5);
        assert!((var - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_layer_norm_constant_vector_is_zero() {
        let x = Tensor::from_vec(vec![3.0f32; 8], [2, 4]).unwrap();
        let y = layer_norm(&x, &vec1(&[1.0; 4]), &vec1(&[0.0; 4]), 1e-5).unwrap();
        assert!(y.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_layer_norm_scale_and_shift() {
        let x = Tensor::from_vec(vec![5.0f32; 2], [2]).unwrap();
        let y = layer_norm(&x, &vec1(&[2.0, 2.0]), &vec1(&[1.0, -1.0]), 1e-5).unwrap();
        assert_eq!(y.data(), &[1.0, -1.0]);
    }

    #[test]
    fn test_layer_norm_rejects_unstable_input() {
        let x = vec1(&[1.0, f32::NAN]);
        let err = layer_norm(&x, &vec1(&[1.0; 2]), &vec1(&[0.0; 2]), 1e-5).unwrap_err();
        assert!(matches!(err, KernelError::Tensor(TensorError::HasNaN { .. })));

        let w = vec1(&[1.0, f32::INFINITY]);
        let err = layer_norm(&vec1(&[1.0, 2.0]), &w, &vec1(&[0.0; 2]), 1e-5).unwrap_err();
        assert!(matches!(err, KernelError::Tensor(TensorError::HasPositiveInfinity { .. })));
    }

    #[test]
    fn test_layer_norm_validation_errors() {
        let x = vec1(&[1.0, 2.0, 3.0]);
        let w = vec1(&[1.0; 3]);
        let b = vec1(&[0.0; 3]);
        assert!(matches!(
            layer_norm(&x, &w, &b, 0.0),
            Err(KernelError::InvalidEpsilon { .. })
        ));
        assert!(matches!(
            layer_norm(&Tensor::scalar(1.0f32), &w, &b, 1e-5),
            Err(KernelError::InvalidShape { .. })
        ));
        assert!(matches!(
            layer_norm(&x, &vec1(&[1.0; 2]), &b, 1e-5),
            Err(KernelError::InvalidWeightShape { expected: 3, .. })
        ));
        assert!(matches!(
            layer_norm(&x, &w, &vec1(&[0.0; 4]), 1e-5),
            Err(KernelError::InvalidBiasShape { expected: 3, .. })
        ));
    }

    #[test]
    fn test_layer_norm_overflow_is_reported() {
        let x = vec1(&[0.0, 1.0]);
        let w = vec1(&[f32::MAX, f32::MAX]);
        let b = vec1(&[f32::MAX, f32::MAX]);
        assert!(matches!(
            layer_norm(&x, &w, &b, 1e-5),
            Err(KernelError::ComputedInfinity { index: 1 })
        ));
    }

    #[test]
    fn test_layer_norm_overflowing_statistics_report_nan() {
        // the row sum overflows to inf, so every centered value is -inf / inf
        let x = Tensor::from_vec(vec![f64::MAX, f64::MAX], [2]).unwrap();
        let w = Tensor::<f64>::ones([2]).unwrap();
        let b = Tensor::<f64>::zeros([2]).unwrap();
        assert!(matches!(
            layer_norm(&x, &w, &b, 1e-5),
            Err(KernelError::ComputedNaN { index: 0 })
        ));
    }

    #[test]
    fn test_layer_norm_zero_size_batch() {
        let x = Tensor::<f32>::zeros([0, 4]).unwrap();
        let y = layer_norm(&x, &vec1(&[1.0; 4]), &vec1(&[0.0; 4]), 1e-5).unwrap();
        assert_eq!(y.shape(), &[0, 4]);
    }

    #[test]
    fn test_from_weights_checks_bias() {
        let err = LayerNorm::from_weights(vec1(&[1.0; 3]), vec1(&[0.0; 2]), 1e-5).unwrap_err();
        assert!(matches!(err, KernelError::InvalidBiasShape { .. }));
    }
}
