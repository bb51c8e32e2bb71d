use std::fmt::Debug;

use ar_tensor::{MatRef, Shape};

use crate::error::Result;

/// Backends a dense layer can be executed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendId {
    /// The built-in parallel CPU kernel.
    Default,
    /// An injected [`AcceleratedBackend`].
    Accelerated,
}

/// How an accelerated backend should schedule the layer's output loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleHint {
    /// Degenerate output (sample and channel counts add up to one); leave the
    /// loop alone.
    None,
    /// Run samples in parallel.
    Parallel,
    /// Split the channel loop by `factor`, run the outer tiles in parallel and
    /// vectorize the inner split.
    SplitVectorize { factor: usize },
}

/// Channel split used when the output is wider than one vector.
const SPLIT_FACTOR: usize = 8;

/// Schedule suggested for an output of `output_shape` (`[outer, num_output]`).
///
/// Samples and channels are taken as the first and last dims. Only a
/// degenerate output whose sample and channel counts add up to one is left
/// unscheduled; a `1 x 1` output still runs `Parallel`.
pub fn schedule_hint(output_shape: &Shape) -> ScheduleHint {
    let dims = output_shape.dims();
    let (samples, channels) = match (dims.first(), dims.last()) {
        (Some(&n), Some(&c)) if dims.len() > 1 => (n, c),
        (Some(&c), _) => (1, c),
        _ => (1, 1),
    };
    if samples + channels == 1 {
        return ScheduleHint::None;
    }
    if channels > SPLIT_FACTOR {
        ScheduleHint::SplitVectorize {
            factor: SPLIT_FACTOR,
        }
    } else {
        ScheduleHint::Parallel
    }
}

/// Everything a backend needs to build a node for one dense layer.
#[derive(Debug, Clone)]
pub struct DenseNodeSpec<'a> {
    /// `(num_output, inner_size)` weights; rows may be padded past `cols()`.
    pub weights: MatRef<'a>,
    /// `(1, num_output)` bias, or `None` when the layer has no bias.
    pub bias: Option<MatRef<'a>>,
    pub input_shape: &'a Shape,
    pub output_shape: Shape,
    pub schedule: ScheduleHint,
}

/// A node built by an [`AcceleratedBackend`]. Opaque to the layer.
pub trait BackendNode: Send + Sync + Debug {
    /// Returns the name of the backend that built this node.
    fn name(&self) -> &str;
}

/// An alternate code-generation backend.
///
/// The layer hands it everything needed to build its own node once, at
/// graph-build time: prepared weights, bias, shapes and a schedule suggestion.
pub trait AcceleratedBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "halide").
    fn name(&self) -> &str;

    /// Whether the backend can build nodes in this process.
    fn is_available(&self) -> bool;

    /// Builds the backend's node for a dense layer.
    fn build(&self, spec: &DenseNodeSpec<'_>) -> Result<Box<dyn BackendNode>>;
}
