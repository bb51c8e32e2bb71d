use ar_tensor::{Mat, MatRef, Shape, Tensor, VEC_ALIGN};

use crate::config::DenseConfig;
use crate::error::{LayerError, Result};

/// Weight matrix and bias vector in kernel layout. Read-only once built.
#[derive(Debug, Clone)]
pub struct PreparedWeights {
    weights: Mat,
    bias: Mat,
    has_bias: bool,
}

impl PreparedWeights {
    /// The `(num_output, inner_size)` weight matrix. Rows are padded with
    /// zeros up to `step()` when `inner_size` is not a multiple of [`VEC_ALIGN`].
    pub fn weights(&self) -> MatRef<'_> {
        self.weights.view()
    }

    /// The `(1, num_output)` bias row; all zeros when bias is disabled.
    pub fn bias(&self) -> MatRef<'_> {
        self.bias.view()
    }

    /// Whether the bias came from a blob rather than being synthesized.
    pub fn has_bias(&self) -> bool {
        self.has_bias
    }

    pub fn num_output(&self) -> usize {
        self.weights.rows()
    }

    pub fn inner_size(&self) -> usize {
        self.weights.cols()
    }

    /// Logical weight shape `[num_output, inner_size]`.
    pub fn weight_shape(&self) -> Shape {
        Shape::matrix(self.weights.rows(), self.weights.cols())
    }
}

fn require_f32(blob: &Tensor) -> Result<&[f32]> {
    if !blob.dtype().is_computable() {
        return Err(LayerError::TypeUnsupported(blob.dtype()));
    }
    Ok(blob.data_f32()?)
}

/// Validates `blobs` (weights, then optional bias) against `config` and
/// builds the kernel layout: a `(num_output, inner_size)` weight matrix whose
/// rows are padded with zeros to a multiple of [`VEC_ALIGN`], and a
/// `(1, num_output)` bias row that always exists.
pub fn prepare(blobs: &[Tensor], config: &DenseConfig) -> Result<PreparedWeights> {
    config.validate()?;
    if blobs.is_empty() || blobs.len() > 2 {
        return Err(LayerError::ShapeMismatch(format!(
            "expected 1 or 2 blobs (weights, optional bias), got {}",
            blobs.len()
        )));
    }

    let blob = &blobs[0];
    let raw = require_f32(blob)?;
    if blob.shape().ndim() < 2 {
        return Err(LayerError::ShapeMismatch(format!(
            "weights must have at least 2 dimensions, got {}",
            blob.shape()
        )));
    }

    let num_output = config.num_output;
    let total = blob.numel();
    let inner_size = total / num_output;
    if inner_size * num_output != total {
        return Err(LayerError::ShapeMismatch(format!(
            "weights {} ({} elements) cannot be split into {} outputs",
            blob.shape(),
            total,
            num_output
        )));
    }

    let bias = if config.bias {
        let bias_blob = blobs.get(1).ok_or_else(|| {
            LayerError::ShapeMismatch("bias is enabled but no bias blob was supplied".to_string())
        })?;
        let values = require_f32(bias_blob)?;
        if values.len() != num_output {
            return Err(LayerError::BiasShapeMismatch {
                expected: num_output,
                got: values.len(),
            });
        }
        Mat::from_vec(values.to_vec(), 1, num_output)?
    } else {
        if blobs.len() == 2 {
            log::debug!("bias disabled; ignoring supplied bias blob {}", blobs[1].shape());
        }
        Mat::zeros(1, num_output)
    };

    let weights = if inner_size % VEC_ALIGN != 0 {
        let rows = MatRef::new(raw, num_output, inner_size)?;
        let mut padded = Mat::zeros_padded(num_output, inner_size, VEC_ALIGN);
        for r in 0..num_output {
            padded.row_mut(r).copy_from_slice(rows.row(r));
        }
        log::debug!(
            "padded weights {}x{} to row step {}",
            num_output,
            inner_size,
            padded.step()
        );
        padded
    } else {
        Mat::from_vec(raw.to_vec(), num_output, inner_size)?
    };

    Ok(PreparedWeights {
        weights,
        bias,
        has_bias: config.bias,
    })
}
