//! Facade re-exports for rustml-tensor

pub use crate::api::error::*;
pub use crate::api::types::*;
pub use crate::core::coords::{index_of, index_to_coords, checked_numel, normalize_axis, numel, strides, TensorShape};
pub use crate::core::runtime::RuntimeConfig;
pub use crate::core::tensor::{MatmulBackend, StabilityReport, Tensor};
