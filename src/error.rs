use thiserror::Error;

use crate::tensor::tensor_shape::TensorShape;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvNetError {
    // Call-time errors
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: TensorShape,
        actual: TensorShape,
    },

    #[error("Index (depth {depth}, row {row}, col {col}) out of bounds for tensor of shape {shape}")]
    IndexOutOfBounds {
        depth: usize,
        row: usize,
        col: usize,
        shape: TensorShape,
    },

    #[error("{what} index {index} out of range, layer has {len}")]
    ParameterOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Expected {expected} parameter values, got {actual}")]
    ParameterCountMismatch { expected: usize, actual: usize },

    #[error("Expected {expected} tensor values, got {actual}")]
    DataLengthMismatch { expected: usize, actual: usize },

    #[error("Backward pass requested before any forward pass was recorded")]
    MissingForwardPass,

    // Construction errors
    #[error("Degenerate layer configuration: {0}")]
    DegenerateConfig(String),
}

pub type Result<T> = std::result::Result<T, ConvNetError>;
