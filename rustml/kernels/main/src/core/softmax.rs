//! Numerically stable softmax along an arbitrary axis.

use crate::api::error::KernelResult;
use rustml_tensor::{normalize_axis, Float, Tensor};

/// Softmax in place along `axis` (negative axes count from the end).
///
/// Each lane is shifted by its maximum before exponentiation. A lane whose
/// maximum is `-inf` (fully masked) becomes all zeros, and a lane whose
/// exponentials sum to zero is left unnormalized.
pub fn softmax<T: Float>(x: &mut Tensor<T>, axis: i64) -> KernelResult<()> {
    let axis = normalize_axis(axis, x.ndim())?;
    // A zero-size axis anywhere leaves no lanes, and a zero stride.
    if x.is_empty() {
        return Ok(());
    }
    let count = x.shape()[axis];
    let stride = x.strides()[axis];
    let block = count * stride;
    let data = x.data_mut();

    // Lane starts: every index whose coordinate on `axis` is zero.
    for outer in (0..data.len()).step_by(block) {
        for inner in 0..stride {
            let base = outer + inner;
            softmax_lane(data, base, stride, count);
        }
    }
    Ok(())
}

fn softmax_lane<T: Float>(data: &mut [T], base: usize, stride: usize, count: usize) {
    let mut max = T::NEG_INFINITY;
    for k in 0..count {
        let v = data[base + k * stride];
        if v > max {
            max = v;
        }
    }

    if max == T::NEG_INFINITY {
        for k in 0..count {
            data[base + k * stride] = T::ZERO;
        }
        return;
    }

    let mut sum = T::ZERO;
    for k in 0..count {
        let idx = base + k * stride;
        let e = (data[idx] - max).exp();
        data[idx] = e;
        sum = sum + e;
    }

    if sum == T::ZERO {
        return;
    }
    for k in 0..count {
        let idx = base + k * stride;
        data[idx] = data[idx] / sum;
    }
}
