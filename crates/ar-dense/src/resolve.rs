use ar_tensor::Shape;

use crate::error::{LayerError, Result};

/// Output shape of a dense layer for each input.
///
/// Every input is flattened around `axis` on its own: the dims strictly before
/// the (clamped) axis multiply into the output row count, and the column count
/// is the weight matrix's row count. So `[2, 3, 4]` with `axis = 1` and a
/// `[5, 12]` weight resolves to `[2, 5]`.
pub fn resolve_output_shapes(
    inputs: &[Shape],
    axis: isize,
    weight_shape: &Shape,
) -> Result<Vec<Shape>> {
    if weight_shape.ndim() != 2 {
        return Err(LayerError::ShapeMismatch(format!(
            "weight shape must be 2-D, got {}",
            weight_shape
        )));
    }
    if inputs.is_empty() {
        return Err(LayerError::ShapeMismatch("no inputs to resolve".to_string()));
    }

    let num_output = weight_shape.dim(0);
    inputs
        .iter()
        .map(|input| {
            let axis = input.clamp_axis(axis)?;
            Ok(Shape::matrix(input.total_range(0, axis), num_output))
        })
        .collect()
}
