use crate::api::error::KernelResult;
use rustml_tensor::{Numeric, Tensor, TensorError};

/// Index of the largest value in the last row along the last axis.
///
/// For logits `[.., seq, vocab]` this picks the next token for the most
/// recent position. Ties go to the lowest index.
pub fn argmax<T: Numeric>(x: &Tensor<T>) -> KernelResult<usize> {
    if x.is_empty() {
        return Err(TensorError::EmptyTensor.into());
    }
    let data = x.data();
    let width = x.shape().last().copied().unwrap_or(1);
    if width == 0 {
        return Err(TensorError::EmptyTensor.into());
    }
    let row = &data[data.len() - width..];

    let mut best = 0;
    for (i, &v) in row.iter().enumerate().skip(1) {
        if v > row[best] {
            best = i;
        }
    }
    Ok(best)
}
