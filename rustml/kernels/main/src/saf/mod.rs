//! Facade re-exports for rustml-kernels

pub use crate::api::error::*;
pub use crate::core::activation::gelu;
pub use crate::core::attention::scaled_dot_product_attention;
pub use crate::core::config::KernelConfig;
pub use crate::core::layer_norm::{layer_norm, LayerNorm};
pub use crate::core::mask::create_attention_mask;
pub use crate::core::rope::{apply_rotary_emb, contiguous_positions, precompute_freqs_cis, RotaryEmbedding};
pub use crate::core::sampling::argmax;
pub use crate::core::softmax::softmax;
