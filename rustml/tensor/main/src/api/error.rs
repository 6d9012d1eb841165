//! Error types for tensor operations

use thiserror::Error;

/// Result type for tensor operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Errors that can occur in tensor operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    // ==================== Shape / contract violations ====================
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("Incompatible shapes along dim {dim}: {lhs:?} vs {rhs:?}")]
    IncompatibleShapes {
        dim: usize,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    #[error("Dimension mismatch: rank {lhs} vs rank {rhs}")]
    DimensionMismatch { lhs: usize, rhs: usize },

    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension { dim: i64, ndim: usize },

    #[error("Invalid dimension range: start {start} is after end {end}")]
    InvalidDimRange { start: usize, end: usize },

    #[error("Unsupported dimension: expected a {expected}D tensor, got {got}D")]
    UnsupportedDimension { expected: usize, got: usize },

    #[error("Incompatible dimensions for matmul: left has {left} columns, right has {right} rows")]
    IncompatibleDimensions { left: usize, right: usize },

    #[error("Invalid dimensions: expected {expected}D operands, got {lhs}D and {rhs}D")]
    InvalidDimensions { expected: usize, lhs: usize, rhs: usize },

    #[error("Invalid broadcast: {from:?} has more dimensions than {to:?}")]
    InvalidBroadcast { from: Vec<usize>, to: Vec<usize> },

    #[error("Incompatible broadcast: cannot broadcast {from:?} to {to:?}")]
    IncompatibleBroadcast { from: Vec<usize>, to: Vec<usize> },

    #[error("Invalid number of chunks {num_chunks} for dimension of size {dim_size}")]
    InvalidNumChunks { num_chunks: usize, dim_size: usize },

    #[error("Invalid chunk index {chunk_idx} for {num_chunks} chunks")]
    InvalidChunkIndex { chunk_idx: usize, num_chunks: usize },

    #[error("Dimension of size {dim_size} cannot be split into {num_chunks} equal chunks")]
    UnevenChunkSize { dim_size: usize, num_chunks: usize },

    #[error("Empty tensor list")]
    EmptyTensorList,

    #[error("Empty tensor")]
    EmptyTensor,

    // ==================== Storage ====================
    #[error("Index {index} out of bounds for dim {dim} with size {size}")]
    IndexOutOfBounds { dim: usize, index: usize, size: usize },

    #[error("Invalid slice range {start}..{end} for dimension of size {size}")]
    InvalidSliceRange { start: usize, end: usize, size: usize },

    #[error("Out of memory: tried to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    // ==================== Stability audits ====================
    #[error("Tensor contains {count} NaN value(s), first at index {first_index}")]
    HasNaN { count: usize, first_index: usize },

    #[error("Tensor contains {count} +inf value(s), first at index {first_index}")]
    HasPositiveInfinity { count: usize, first_index: usize },

    #[error("Tensor contains {count} -inf value(s), first at index {first_index}")]
    HasNegativeInfinity { count: usize, first_index: usize },
}
