//! Error types for kernel operations

use rustml_tensor::TensorError;
use thiserror::Error;

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors that can occur in kernel operations
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),

    // ==================== Layer norm ====================
    #[error("Invalid epsilon {eps}: must be > 0")]
    InvalidEpsilon { eps: f64 },

    #[error("Invalid input shape {shape:?}: expected at least one dimension")]
    InvalidShape { shape: Vec<usize> },

    #[error("Invalid weight shape {got:?}: expected [{expected}]")]
    InvalidWeightShape { expected: usize, got: Vec<usize> },

    #[error("Invalid bias shape {got:?}: expected [{expected}]")]
    InvalidBiasShape { expected: usize, got: Vec<usize> },

    #[error("Negative variance {variance} in row {row}")]
    NegativeVariance { variance: f64, row: usize },

    #[error("Zero standard deviation in row {row}")]
    ZeroStandardDeviation { row: usize },

    #[error("Computed NaN at index {index}")]
    ComputedNaN { index: usize },

    #[error("Computed infinity at index {index}")]
    ComputedInfinity { index: usize },

    // ==================== Rotary frequencies ====================
    #[error("Rotary dimension {dim} must be even")]
    DimensionNotEven { dim: usize },

    #[error("Rotary dimension {dim} must be > 0")]
    DimensionTooSmall { dim: usize },

    #[error("Frequency table length {end} must be > 0")]
    EndTooSmall { end: usize },

    #[error("Rotary theta {theta} must be > 0")]
    ThetaTooSmall { theta: f64 },

    #[error("Frequency exponent {exponent} outside [-1000, 1000]")]
    ComputationOverflow { exponent: f64 },

    #[error("Non-finite frequency at index {index}")]
    NumericalInstability { index: usize },

    // ==================== Rotary application ====================
    #[error("Invalid input dimensions {got:?}: expected a {expected}D tensor [heads, seq, head_dim]")]
    InvalidInputDimensions { expected: usize, got: Vec<usize> },

    #[error("Invalid rotation dimension {rot_dim}: expected {expected} (head_dim {head_dim})")]
    InvalidRotationDimension {
        rot_dim: usize,
        expected: usize,
        head_dim: usize,
    },

    // ==================== Configuration ====================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
