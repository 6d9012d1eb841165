//! # RustML Kernels
//!
//! Transformer-style numeric kernels built on `rustml-tensor`.
//!
//! - Layer normalization with staged stability checks
//! - Rotary position embeddings (frequency tables and application)
//! - Causal attention masks and scaled-dot-product attention
//! - Softmax along any axis, GELU, argmax
//!
//! ## Example
//!
//! ```rust
//! use rustml_kernels::{create_attention_mask, softmax};
//! use rustml_tensor::Tensor;
//!
//! let mask = create_attention_mask(2, 3).unwrap();
//! assert_eq!(mask.shape(), &[1, 3, 5]);
//!
//! let mut scores = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], [1, 3]).unwrap();
//! softmax(&mut scores, -1).unwrap();
//! let sum: f32 = scores.iter().sum();
//! assert!((sum - 1.0).abs() < 1e-6);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
