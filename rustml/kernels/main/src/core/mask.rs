use crate::api::error::KernelResult;
use rustml_tensor::{Tensor, TensorError};

/// Build a causal mask `[1, seq_len, pos + seq_len]` for `seq_len` new tokens
/// following `pos` cached ones.
///
/// `true` means visible. Every new token sees the whole cache and the new
/// tokens up to and including itself.
pub fn create_attention_mask(pos: usize, seq_len: usize) -> KernelResult<Tensor<bool>> {
    let total = pos.checked_add(seq_len).ok_or_else(|| {
        TensorError::InvalidOperation(format!("mask length {} + {} overflows", pos, seq_len))
    })?;
    let mut mask = Tensor::<bool>::zeros([1, seq_len, total])?;
    if total > 0 {
        for (i, row) in mask.data_mut().chunks_exact_mut(total).enumerate() {
            for (j, visible) in row.iter_mut().enumerate() {
                *visible = j < pos || j - pos <= i;
            }
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::KernelError;

    #[test]
    fn test_mask_with_cache() {
        let mask = create_attention_mask(2, 3).unwrap();
        assert_eq!(mask.shape(), &[1, 3, 5]);
        let (t, f) = (true, false);
        assert_eq!(
            mask.data(),
            &[t, t, t, f, f, t, t, t, t, f, t, t, t, t, t]
        );
    }

    #[test]
    fn test_mask_without_cache_is_lower_triangular() {
        let mask = create_attention_mask(0, 3).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(mask.get(&[0, i, j]).unwrap(), j <= i);
            }
        }
    }

    #[test]
    fn test_mask_length_overflow() {
        assert!(matches!(
            create_attention_mask(usize::MAX, 1),
            Err(KernelError::Tensor(TensorError::InvalidOperation(_)))
        ));
        assert!(matches!(
            create_attention_mask(usize::MAX / 2, usize::MAX / 4),
            Err(KernelError::Tensor(TensorError::OutOfMemory { .. }))
        ));
    }

    #[test]
    fn test_mask_empty() {
        let mask = create_attention_mask(4, 0).unwrap();
        assert_eq!(mask.shape(), &[1, 0, 4]);
        assert!(mask.is_empty());
    }
}
