use ar_tensor::{DType, TensorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayerError {
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("unsupported element type: {0} (only f32 is supported)")]
    TypeUnsupported(DType),
    #[error("bias length mismatch: expected {expected}, got {got}")]
    BiasShapeMismatch { expected: usize, got: usize },
    #[error("missing layer parameter: {0}")]
    MissingParam(String),
    #[error("type mismatch for parameter '{key}': expected {expected}, got {got}")]
    ParamType {
        key: String,
        expected: String,
        got: String,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("tensor error: {0}")]
    Tensor(TensorError),
}

impl From<TensorError> for LayerError {
    fn from(err: TensorError) -> Self {
        match err {
            TensorError::ShapeMismatch { .. } | TensorError::InvalidAxis { .. } => {
                LayerError::ShapeMismatch(err.to_string())
            }
            TensorError::BiasShapeMismatch { expected, got } => {
                LayerError::BiasShapeMismatch { expected, got }
            }
            TensorError::UnsupportedDType(dtype) | TensorError::DTypeMismatch { got: dtype, .. } => {
                LayerError::TypeUnsupported(dtype)
            }
            other => LayerError::Tensor(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_errors_fold_into_shape_mismatch() {
        let err: LayerError = TensorError::InvalidAxis { axis: 3, ndim: 2 }.into();
        assert!(matches!(err, LayerError::ShapeMismatch(_)));
        let err: LayerError = TensorError::ShapeMismatch {
            expected: vec![2],
            got: vec![3],
        }
        .into();
        assert!(matches!(err, LayerError::ShapeMismatch(_)));
    }

    #[test]
    fn test_bias_error_keeps_counts() {
        let err: LayerError = TensorError::BiasShapeMismatch { expected: 5, got: 4 }.into();
        assert!(matches!(
            err,
            LayerError::BiasShapeMismatch { expected: 5, got: 4 }
        ));
    }

    #[test]
    fn test_dtype_errors_fold_into_type_unsupported() {
        let err: LayerError = TensorError::UnsupportedDType(DType::F16).into();
        assert!(matches!(err, LayerError::TypeUnsupported(DType::F16)));
    }

    #[test]
    fn test_other_errors_are_wrapped() {
        let err: LayerError = TensorError::Other("boom".to_string()).into();
        assert!(matches!(err, LayerError::Tensor(_)));
        assert_eq!(err.to_string(), "tensor error: boom");
    }
}
