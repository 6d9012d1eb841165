//! Rotary Position Encoding (RoPE).
//!
//! Frequencies are stored as a `[end, dim / 2, 2]` table of `(cos, sin)`
//! pairs, one row per absolute position. Application treats each pair of
//! features as a complex number and rotates it by the angle of its position.

use std::time::Instant;
use crate::api::error::{KernelError, KernelResult};
use rustml_tensor::{Float, Tensor, TensorError};

/// Precompute the `(cos, sin)` table for positions `0..end`.
///
/// `freq[i] = 1 / theta^(2i / dim)` for `i` in `0..dim / 2`; the angle for
/// position `t` is `t * freq[i]`.
pub fn precompute_freqs_cis<T: Float>(dim: usize, end: usize, theta: f64) -> KernelResult<Tensor<T>> {
    if dim == 0 {
        return Err(KernelError::DimensionTooSmall { dim });
    }
    if dim % 2 != 0 {
        return Err(KernelError::DimensionNotEven { dim });
    }
    if end == 0 {
        return Err(KernelError::EndTooSmall { end });
    }
    if !(theta > 0.0) {
        return Err(KernelError::ThetaTooSmall { theta });
    }

    let half = dim / 2;
    let ln_theta = theta.ln();
    let mut freqs = Vec::with_capacity(half);
    for i in 0..half {
        let exponent = (2 * i) as f64 / dim as f64 * ln_theta;
        if !(-1000.0..=1000.0).contains(&exponent) {
            return Err(KernelError::ComputationOverflow { exponent });
        }
        let freq = T::from_f64((-exponent).exp());
        if !freq.is_finite() {
            return Err(KernelError::NumericalInstability { index: i });
        }
        freqs.push(freq);
    }

    let freqs = Tensor::from_vec(freqs, [half])?;
    let times = Tensor::<T>::arange(end)?;
    let angles = times.outer(&freqs)?;

    let mut cos = angles.clone();
    let mut sin = angles;
    for v in cos.data_mut() {
        *v = v.cos();
    }
    for v in sin.data_mut() {
        *v = v.sin();
    }
    let table = Tensor::stack(&[cos, sin], 2)?;
    if let Some(index) = table.iter().position(|v| !v.is_finite()) {
        return Err(KernelError::NumericalInstability { index });
    }
    Ok(table)
}

/// Position ids `start, start + 1, ..., start + len - 1`.
pub fn contiguous_positions(start: usize, len: usize) -> KernelResult<Vec<usize>> {
    let end = start.checked_add(len).ok_or_else(|| {
        TensorError::InvalidOperation(format!("position range {} + {} overflows", start, len))
    })?;
    Ok((start..end).collect())
}

/// Rotate the first `rot_dim` features of `x` (`[heads, seq, head_dim]`).
///
/// `position_ids[s]` selects the row of `freqs_cis` used for sequence index
/// `s`, so cached or non-contiguous positions work. With `interleave` the
/// input features are read as `(re, im)` pairs `[r0, i0, r1, i1, ..]`;
/// without it as two halves `[r0, r1, .., i0, i1, ..]`. Either way the
/// rotated prefix is written back as interleaved pairs, and features past
/// `rot_dim` pass through unchanged.
pub fn apply_rotary_emb<T: Float>(
    x: &Tensor<T>,
    freqs_cis: &Tensor<T>,
    position_ids: &[usize],
    rot_dim: usize,
    interleave: bool,
) -> KernelResult<Tensor<T>> {
    let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };

    if x.ndim() != 3 {
        return Err(KernelError::InvalidInputDimensions {
            expected: 3,
            got: x.shape().to_vec(),
        });
    }
    if freqs_cis.ndim() != 3 || freqs_cis.shape()[2] != 2 {
        return Err(TensorError::ShapeMismatch {
            expected: vec![freqs_cis.shape().first().copied().unwrap_or(0), rot_dim / 2, 2],
            got: freqs_cis.shape().to_vec(),
        }
        .into());
    }
    let (heads, seq, head_dim) = (x.shape()[0], x.shape()[1], x.shape()[2]);
    let half = freqs_cis.shape()[1];
    if rot_dim != 2 * half || rot_dim > head_dim {
        return Err(KernelError::InvalidRotationDimension {
            rot_dim,
            expected: 2 * half,
            head_dim,
        });
    }
    if position_ids.len() != seq {
        return Err(TensorError::ShapeMismatch {
            expected: vec![seq],
            got: vec![position_ids.len()],
        }
        .into());
    }

    // Split off the rotated prefix
    let x_rot = x.slice(2, 0, rot_dim)?;
    let x_pass = if rot_dim < head_dim {
        Some(x.slice(2, rot_dim, head_dim)?)
    } else {
        None
    };

    let (real, imag) = if interleave {
        let pairs = x_rot.into_shape(&[heads, seq, half, 2])?;
        (pairs.select(3, 0)?, pairs.select(3, 1)?)
    } else {
        (x_rot.chunk(2, 0, 2)?, x_rot.chunk(2, 1, 2)?)
    };

    // Gather per-position rows: [seq, half, 2]
    let mut rows = Vec::with_capacity(seq);
    for &pos in position_ids {
        rows.push(freqs_cis.select(0, pos)?);
    }
    let (cos, sin) = if rows.is_empty() {
        (Tensor::zeros([0, half])?, Tensor::zeros([0, half])?)
    } else {
        let gathered = Tensor::stack(&rows, 0)?;
        (gathered.select(2, 0)?, gathered.select(2, 1)?)
    };

    // [heads, seq, half] * [seq, half]: the cyclic broadcast repeats the
    // per-position table across heads.
    let mut out_r = real.clone();
    out_r.broadcast_mul(&cos)?;
    let mut i_sin = imag.clone();
    i_sin.broadcast_mul(&sin)?;
    out_r.sub(&i_sin)?;

    let mut out_i = real;
    out_i.broadcast_mul(&sin)?;
    let mut i_cos = imag;
    i_cos.broadcast_mul(&cos)?;
    out_i.add(&i_cos)?;

    // Output pairs are always interleaved: [r0, i0, r1, i1, ..]
    let mut rotated = Tensor::stack(&[out_r, out_i], 3)?;
    rotated.flatten(2, 3)?;

    let out = match x_pass {
        Some(pass) => rotated.concat(&pass, 2)?,
        None => rotated,
    };

    if let Some(t) = _t {
        log::trace!(
            "[perf] rope::apply {:?} rot_dim={} {:.3}ms",
            x.shape(),
            rot_dim,
            t.elapsed().as_secs_f64() * 1000.0
        );
    }
    Ok(out)
}

/// A precomputed frequency table together with how to apply it.
#[derive(Debug, Clone)]
pub struct RotaryEmbedding<T: Float> {
    freqs_cis: Tensor<T>,
    rot_dim: usize,
    interleave: bool,
}

impl<T: Float> RotaryEmbedding<T> {
    /// Build the table for `rot_dim` rotated features and positions `0..max_positions`.
    pub fn new(rot_dim: usize, max_positions: usize, theta: f64, interleave: bool) -> KernelResult<Self> {
        Ok(Self {
            freqs_cis: precompute_freqs_cis(rot_dim, max_positions, theta)?,
            rot_dim,
            interleave,
        })
    }

    pub fn rot_dim(&self) -> usize {
        self.rot_dim
    }

    pub fn max_positions(&self) -> usize {
        self.freqs_cis.shape()[0]
    }

    /// The `[max_positions, rot_dim / 2, 2]` `(cos, sin)` table.
    pub fn freqs_cis(&self) -> &Tensor<T> {
        &self.freqs_cis
    }

    /// Apply to `x` (`[heads, seq, head_dim]`) at the given positions.
    pub fn apply(&self, x: &Tensor<T>, position_ids: &[usize]) -> KernelResult<Tensor<T>> {
        apply_rotary_emb(x, &self.freqs_cis, position_ids, self.rot_dim, self.interleave)
    }

    /// Apply to `x` for positions `start_pos..start_pos + seq`.
    pub fn apply_from(&self, x: &Tensor<T>, start_pos: usize) -> KernelResult<Tensor<T>> {
        let seq = x.shape().get(1).copied().unwrap_or(0);
        self.apply(x, &contiguous_positions(start_pos, seq)?)
    }
}
