use thiserror::Error;

use crate::dtype::DType;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: DType, got: DType },
    #[error("invalid axis {axis} for tensor with {ndim} dimensions")]
    InvalidAxis { axis: isize, ndim: usize },
    #[error("bias length mismatch: expected {expected}, got {got}")]
    BiasShapeMismatch { expected: usize, got: usize },
    #[error("unsupported dtype: {0}")]
    UnsupportedDType(DType),
    #[error("fast path {0} is not supported on this host")]
    UnsupportedFastPath(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TensorError>;
