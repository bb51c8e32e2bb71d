//! Dense (fully-connected) layer for affine-runtime.
//!
//! [`DenseLayer`] prepares its weights once, resolves output shapes, and runs
//! the parallel affine kernel from `ar-tensor` on an injected worker pool. An
//! alternate code-generation backend can be plugged in through [`accel`].

pub mod accel;
pub mod config;
pub mod cost;
pub mod error;
pub mod layer;
pub mod params;
pub mod resolve;
pub mod weights;

pub use accel::{AcceleratedBackend, BackendId, BackendNode, DenseNodeSpec, ScheduleHint};
pub use config::DenseConfig;
pub use error::{LayerError, Result};
pub use layer::DenseLayer;
pub use params::{LayerParams, ParamValue};
pub use weights::PreparedWeights;
