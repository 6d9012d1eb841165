mod ops;
mod stability;
#[allow(clippy::module_inception)]
mod tensor;
mod transform;
mod views;

pub(crate) mod linalg;

pub use linalg::MatmulBackend;
pub use stability::StabilityReport;
pub use tensor::Tensor;
