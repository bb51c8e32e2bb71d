use std::fmt;
use std::sync::OnceLock;

use super::scalar;
use crate::mat::MatRef;

/// Row alignment, in elements, that prepared weight matrices are padded to.
///
/// The widest vector path reads eight lanes at a time, so padding rows to a
/// multiple of eight lets it load the last partial group of a row in full.
pub const VEC_ALIGN: usize = 8;

static DETECTED: OnceLock<FastPath> = OnceLock::new();

/// Interchangeable implementations of the dot-product-plus-bias step.
///
/// All paths compute the same values up to float reassociation; they differ
/// only in vector width and instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FastPath {
    /// One output column at a time.
    Scalar,
    /// Four columns by four lanes (SSE on x86_64, NEON on aarch64).
    Simd128,
    /// Eight columns by eight lanes with fused multiply-add (x86_64 AVX2 + FMA).
    Avx2,
}

impl FastPath {
    /// Best path for this host. Probed once per process.
    pub fn detect() -> FastPath {
        *DETECTED.get_or_init(|| {
            let path = Self::available()
                .into_iter()
                .max()
                .unwrap_or(FastPath::Scalar);
            log::info!("affine kernel fast path: {}", path);
            path
        })
    }

    /// Every path the host can run, narrowest first.
    pub fn available() -> Vec<FastPath> {
        [FastPath::Scalar, FastPath::Simd128, FastPath::Avx2]
            .into_iter()
            .filter(|p| p.is_supported())
            .collect()
    }

    /// Whether the host CPU can run this path.
    pub fn is_supported(self) -> bool {
        match self {
            FastPath::Scalar => true,
            FastPath::Simd128 => simd128_supported(),
            FastPath::Avx2 => avx2_supported(),
        }
    }

    /// Computes `out[j] = bias[j] + dot(x, weights.row(j))`.
    ///
    /// Vector paths need every weight row readable at `align_up(x.len(), 8)`
    /// elements; callers downgrade to [`FastPath::Scalar`] otherwise.
    pub(crate) fn dot_rows(self, x: &[f32], weights: MatRef<'_>, bias: &[f32], out: &mut [f32]) {
        debug_assert_eq!(weights.rows(), out.len());
        debug_assert_eq!(bias.len(), out.len());
        match self {
            #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
            FastPath::Simd128 => super::simd128::dot_rows(x, weights, bias, out),
            #[cfg(target_arch = "x86_64")]
            // SAFETY: a path is only selected after `is_supported` confirmed
            // avx2 and fma on this CPU.
            FastPath::Avx2 => unsafe { super::avx2::dot_rows(x, weights, bias, out) },
            #[allow(unreachable_patterns)]
            _ => scalar::dot_rows(x, weights, bias, out),
        }
    }
}

impl fmt::Display for FastPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FastPath::Scalar => write!(f, "scalar"),
            FastPath::Simd128 => write!(f, "simd128"),
            FastPath::Avx2 => write!(f, "avx2"),
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn simd128_supported() -> bool {
    is_x86_feature_detected!("sse")
}

#[cfg(target_arch = "aarch64")]
fn simd128_supported() -> bool {
    std::arch::is_aarch64_feature_detected!("neon")
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn simd128_supported() -> bool {
    false
}

#[cfg(target_arch = "x86_64")]
fn avx2_supported() -> bool {
    is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
}

#[cfg(not(target_arch = "x86_64"))]
fn avx2_supported() -> bool {
    false
}
