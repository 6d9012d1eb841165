//! # RustML Tensor
//!
//! Dense N-dimensional tensors for inference-style workloads.
//!
//! A `Tensor<T>` owns a contiguous row-major buffer and its shape. Strides are
//! never stored: every operation derives them from the current shape, so a
//! shape change can never leave stale stride state behind.
//!
//! ## Features
//!
//! - Coordinate/stride arithmetic (`index_of`, `index_to_coords`, `strides`)
//! - Shape transforms: transpose, flatten, chunk, concat, stack
//! - Element-wise and broadcasting arithmetic
//! - NaN / infinity auditing
//! - Reference and faer-accelerated matrix multiplication
//!
//! ## Example
//!
//! ```rust
//! use rustml_tensor::Tensor;
//!
//! let a = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [2, 2]).unwrap();
//! let b = Tensor::from_vec(vec![5.0f32, 6.0, 7.0, 8.0], [2, 2]).unwrap();
//! let c = a.matmul(&b).unwrap();
//! assert_eq!(c.shape(), &[2, 2]);
//! assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
