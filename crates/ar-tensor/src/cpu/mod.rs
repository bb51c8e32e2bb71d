pub mod fast_path;
pub mod fully_connected;
pub mod partition;

#[cfg(target_arch = "x86_64")]
mod avx2;
mod scalar;
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
mod simd128;

pub use fast_path::{FastPath, VEC_ALIGN};
pub use fully_connected::FullyConnected;
