//! `ar-tensor` - Tensor primitives and the parallel affine kernel for affine-runtime.
//!
//! This crate provides:
//! - A `Tensor` type backed by CPU storage, plus row-strided matrix views
//! - Shape utilities (axis clamping, flattening around an axis)
//! - A `ParallelExecutor` trait for the host's worker pool, with rayon and
//!   serial implementations
//! - The `FullyConnected` kernel with scalar, 128-bit and 256-bit fast paths

pub mod cpu;
pub mod dtype;
pub mod error;
pub mod mat;
pub mod parallel;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use cpu::{FastPath, FullyConnected, VEC_ALIGN};
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use mat::{align_up, Mat, MatMut, MatRef};
pub use parallel::{Job, ParallelExecutor, RayonExecutor, SerialExecutor};
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
