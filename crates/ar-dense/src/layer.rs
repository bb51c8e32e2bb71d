use std::sync::Arc;

use ar_tensor::{
    FastPath, FullyConnected, ParallelExecutor, RayonExecutor, Shape, Tensor, TensorError,
};

use crate::accel::{schedule_hint, AcceleratedBackend, BackendId, BackendNode, DenseNodeSpec};
use crate::config::DenseConfig;
use crate::cost::estimate_flops;
use crate::error::{LayerError, Result};
use crate::params::LayerParams;
use crate::resolve::resolve_output_shapes;
use crate::weights::{prepare, PreparedWeights};

/// A dense (fully-connected) layer: `Y = X·Wᵗ + b` for every row of `X`.
///
/// Weights are prepared once in [`DenseLayer::new`] and never written again,
/// so a layer can be shared across threads and run concurrent forward calls.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    config: DenseConfig,
    weights: PreparedWeights,
    executor: Arc<dyn ParallelExecutor>,
    fast_path: Option<FastPath>,
}

impl DenseLayer {
    /// Builds a layer from its weight blob and optional bias blob.
    ///
    /// Runs on rayon's global pool and the host's best fast path unless told
    /// otherwise.
    pub fn new(config: DenseConfig, blobs: &[Tensor]) -> Result<DenseLayer> {
        let weights = prepare(blobs, &config)?;
        log::debug!(
            "dense layer: {} outputs, inner size {}, bias={}, axis={}",
            weights.num_output(),
            weights.inner_size(),
            config.bias,
            config.axis
        );
        Ok(DenseLayer {
            config,
            weights,
            executor: Arc::new(RayonExecutor::new()),
            fast_path: None,
        })
    }

    /// Builds a layer from a parameter bag (see [`DenseConfig::from_params`]).
    pub fn from_params(params: &LayerParams, blobs: &[Tensor]) -> Result<DenseLayer> {
        DenseLayer::new(DenseConfig::from_params(params)?, blobs)
    }

    /// Replaces the worker pool. The layer splits each forward call into
    /// `executor.num_threads()` stripes.
    pub fn with_executor(mut self, executor: Arc<dyn ParallelExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Pins the kernel to `path`. Fails if the host cannot run it.
    pub fn with_fast_path(mut self, path: FastPath) -> Result<Self> {
        if !path.is_supported() {
            return Err(TensorError::UnsupportedFastPath(path.to_string()).into());
        }
        self.fast_path = Some(path);
        Ok(self)
    }

    pub fn config(&self) -> &DenseConfig {
        &self.config
    }

    pub fn weights(&self) -> &PreparedWeights {
        &self.weights
    }

    pub fn executor(&self) -> &dyn ParallelExecutor {
        self.executor.as_ref()
    }

    /// The pinned fast path, if any.
    pub fn fast_path(&self) -> Option<FastPath> {
        self.fast_path
    }

    /// Output shape for each input shape.
    pub fn output_shapes(&self, inputs: &[Shape]) -> Result<Vec<Shape>> {
        resolve_output_shapes(inputs, self.config.axis, &self.weights.weight_shape())
    }

    /// Computes one freshly allocated output per input.
    pub fn forward(&self, inputs: &[Tensor]) -> Result<Vec<Tensor>> {
        let shapes: Vec<Shape> = inputs.iter().map(|t| t.shape().clone()).collect();
        let output_shapes = self.output_shapes(&shapes)?;

        inputs
            .iter()
            .zip(output_shapes)
            .map(|(input, shape)| {
                let mut output = Tensor::zeros(shape);
                self.forward_into(input, &mut output)?;
                Ok(output)
            })
            .collect()
    }

    /// Computes `input` into a caller-allocated `output`.
    ///
    /// `output` must hold `outer * num_output` f32 elements, where `outer` is
    /// the product of the input dims before the layer's axis.
    pub fn forward_into(&self, input: &Tensor, output: &mut Tensor) -> Result<()> {
        for dtype in [input.dtype(), output.dtype()] {
            if !dtype.is_computable() {
                return Err(LayerError::TypeUnsupported(dtype));
            }
        }

        let src = input.as_mat(self.config.axis)?;
        let inner_size = self.weights.inner_size();
        if src.cols() != inner_size {
            return Err(LayerError::ShapeMismatch(format!(
                "input {} flattened at axis {} has {} features, weights expect {}",
                input.shape(),
                self.config.axis,
                src.cols(),
                inner_size
            )));
        }

        let num_output = self.weights.num_output();
        let dst = output.as_mat_mut(src.rows(), num_output)?;
        let bias = if self.weights.has_bias() {
            Some(self.weights.bias())
        } else {
            None
        };
        let nstripes = self.executor.num_threads();

        let mut kernel = FullyConnected::new(src, self.weights.weights(), bias, dst, nstripes)?;
        if let Some(path) = self.fast_path {
            kernel = kernel.with_fast_path(path)?;
        }
        log::trace!(
            "dense forward: {}x{} -> {}x{}, {} stripes on {}, path {}",
            src.rows(),
            inner_size,
            src.rows(),
            num_output,
            nstripes,
            self.executor.name(),
            kernel.fast_path()
        );
        kernel.run(self.executor.as_ref());
        Ok(())
    }

    /// Operation count of producing `outputs`.
    pub fn flops(&self, outputs: &[Shape]) -> u64 {
        estimate_flops(self.weights.inner_size(), outputs)
    }

    /// Whether this layer can run on `id`.
    ///
    /// The default kernel always can. An accelerated backend must be present
    /// and available, and the layer must flatten at axis 1.
    pub fn supports_backend(&self, id: BackendId, backend: Option<&dyn AcceleratedBackend>) -> bool {
        match id {
            BackendId::Default => true,
            BackendId::Accelerated => {
                self.config.axis == 1 && backend.map_or(false, |b| b.is_available())
            }
        }
    }

    /// Builds `backend`'s node for this layer, given the shape of its input.
    pub fn init_backend(
        &self,
        backend: &dyn AcceleratedBackend,
        input_shape: &Shape,
    ) -> Result<Box<dyn BackendNode>> {
        if !self.supports_backend(BackendId::Accelerated, Some(backend)) {
            return Err(LayerError::InvalidConfig(format!(
                "backend '{}' cannot run this layer (available={}, axis={})",
                backend.name(),
                backend.is_available(),
                self.config.axis
            )));
        }

        let (_, inner_size) = input_shape.flatten_at(self.config.axis)?;
        if inner_size != self.weights.inner_size() {
            return Err(LayerError::ShapeMismatch(format!(
                "input {} has {} features, weights expect {}",
                input_shape,
                inner_size,
                self.weights.inner_size()
            )));
        }
        let output_shape = self
            .output_shapes(std::slice::from_ref(input_shape))?
            .remove(0);
        let spec = DenseNodeSpec {
            weights: self.weights.weights(),
            bias: self.weights.has_bias().then(|| self.weights.bias()),
            input_shape,
            schedule: schedule_hint(&output_shape),
            output_shape,
        };
        log::debug!(
            "building {} node: {} -> {}, schedule {:?}",
            backend.name(),
            input_shape,
            spec.output_shape,
            spec.schedule
        );
        backend.build(&spec)
    }
}
