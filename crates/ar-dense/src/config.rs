use crate::error::{LayerError, Result};
use crate::params::LayerParams;

/// Configuration of a dense layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseConfig {
    /// Number of output features (rows of the weight matrix).
    pub num_output: usize,
    /// Whether a bias blob is supplied and added.
    pub bias: bool,
    /// First input axis folded into the inner (feature) dimension. Negative
    /// values count from the end.
    pub axis: isize,
}

impl DenseConfig {
    /// Config with `bias = true` and `axis = 1`.
    pub fn new(num_output: usize) -> Self {
        DenseConfig {
            num_output,
            bias: true,
            axis: 1,
        }
    }

    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_axis(mut self, axis: isize) -> Self {
        self.axis = axis;
        self
    }

    /// Parse a dense configuration from layer parameters.
    ///
    /// Reads the following keys:
    /// - `num_output` -> num_output (required, positive)
    /// - `bias_term` -> bias (default true)
    /// - `axis` -> axis (default 1)
    pub fn from_params(params: &LayerParams) -> Result<DenseConfig> {
        let num_output = params.get_int("num_output")?;
        if num_output <= 0 {
            return Err(LayerError::InvalidConfig(format!(
                "num_output must be positive, got {}",
                num_output
            )));
        }
        let bias = params.get_bool_or("bias_term", true)?;
        let axis = params.get_int_or("axis", 1)?;

        let config = DenseConfig {
            num_output: num_output as usize,
            bias,
            axis: axis as isize,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that do not depend on any tensor.
    pub fn validate(&self) -> Result<()> {
        if self.num_output == 0 {
            return Err(LayerError::InvalidConfig(
                "num_output must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = LayerParams::new().with("num_output", 5i64);
        let c = DenseConfig::from_params(&p).unwrap();
        assert_eq!(c, DenseConfig::new(5));
        assert!(c.bias);
        assert_eq!(c.axis, 1);
    }

    #[test]
    fn test_explicit_values() {
        let p = LayerParams::new()
            .with("num_output", 3i64)
            .with("bias_term", false)
            .with("axis", -1i64);
        let c = DenseConfig::from_params(&p).unwrap();
        assert_eq!(c, DenseConfig::new(3).with_bias(false).with_axis(-1));
    }

    #[test]
    fn test_num_output_required_and_positive() {
        assert!(matches!(
            DenseConfig::from_params(&LayerParams::new()),
            Err(LayerError::MissingParam(_))
        ));
        let p = LayerParams::new().with("num_output", 0i64);
        assert!(matches!(
            DenseConfig::from_params(&p),
            Err(LayerError::InvalidConfig(_))
        ));
        assert!(DenseConfig::new(0).validate().is_err());
    }
}
