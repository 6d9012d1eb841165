#![allow(dead_code)]

use rustml_tensor::Tensor;

/// Create an F32 tensor from an f32 slice and shape.
pub fn make_f32_tensor(data: &[f32], shape: &[usize]) -> Tensor<f32> {
    Tensor::from_vec(data.to_vec(), shape).unwrap()
}

/// Create an F32 tensor holding `0, 1, 2, ...` in row-major order.
pub fn arange_f32(shape: &[usize]) -> Tensor<f32> {
    let n: usize = shape.iter().product();
    Tensor::from_vec((0..n).map(|i| i as f32).collect(), shape).unwrap()
}

/// Assert that two f32 slices are element-wise close within a tolerance.
pub fn assert_f32_near(actual: &[f32], expected: &[f32], tolerance: f32, msg: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: length mismatch (actual={}, expected={})",
        msg,
        actual.len(),
        expected.len()
    );
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).abs() <= tolerance,
            "{}: element [{}] mismatch: actual={}, expected={}, diff={}, tolerance={}",
            msg,
            i,
            a,
            e,
            (a - e).abs(),
            tolerance
        );
    }
}
