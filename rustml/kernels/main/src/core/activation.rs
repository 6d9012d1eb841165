use rustml_tensor::{Float, Tensor};

/// GELU in place, tanh approximation:
/// `0.5 * x * (1 + tanh(sqrt(2 / pi) * (x + 0.044715 * x^3)))`.
pub fn gelu<T: Float>(x: &mut Tensor<T>) {
    let half = T::from_f64(0.5);
    let coeff = T::from_f64(0.044715);
    let scale = T::from_f64((2.0 / std::f64::consts::PI).sqrt());
    for v in x.data_mut().iter_mut() {
        let x = *v;
        let inner = scale * (x + coeff * x * x * x);
        *v = half * x * (T::ONE + inner.tanh());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::bf16;

    #[test]
    fn test_gelu_reference_points() {
        let mut x = Tensor::from_vec(vec![0.0f32, 1.0, -1.0, 3.0], [4]).unwrap();
        gelu(&mut x);
        let expected = [0.0f32, 0.841192, -0.158808, 2.996363];
        for (a, e) in x.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-5, "{} vs {}", a, e);
        }
    }

    #[test]
    fn test_gelu_large_negative_goes_to_zero() {
        let mut x = Tensor::from_vec(vec![-20.0f64], [1]).unwrap();
        gelu(&mut x);
        assert!(x.data()[0].abs() < 1e-12);
    }

    #[test]
    fn test_gelu_half_precision() {
        let mut x = Tensor::from_vec(vec![bf16::from_f32(1.0)], [1]).unwrap();
        gelu(&mut x);
        assert!((x.data()[0].to_f32() - 0.841).abs() < 1e-2);
    }
}
