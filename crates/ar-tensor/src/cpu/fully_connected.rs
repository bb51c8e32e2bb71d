use std::ops::Range;

use super::fast_path::{FastPath, VEC_ALIGN};
use super::partition::{self, runs};
use crate::error::{Result, TensorError};
use crate::mat::{MatMut, MatRef};
use crate::parallel::{Job, ParallelExecutor};

/// One validated invocation of the parallel affine kernel:
/// `dst[i][j] = bias[j] + Σ_k src[i][k] * weights[j][k]`.
///
/// Every shape check happens in [`FullyConnected::new`]; once constructed,
/// [`FullyConnected::run`] cannot fail part way through.
#[derive(Debug)]
pub struct FullyConnected<'a> {
    src: MatRef<'a>,
    weights: MatRef<'a>,
    bias: Option<&'a [f32]>,
    dst: MatMut<'a>,
    nstripes: usize,
    path: FastPath,
}

impl<'a> FullyConnected<'a> {
    /// Validates the operands and picks the host's best fast path.
    ///
    /// - `src`: `outer x inner`
    /// - `weights`: `num_output x inner`, ideally with rows padded to
    ///   [`VEC_ALIGN`]
    /// - `bias`: `None` or a row/contiguous matrix of `num_output` values
    /// - `dst`: `outer x num_output`
    /// - `nstripes`: number of jobs to split the output into (0 means 1)
    pub fn new(
        src: MatRef<'a>,
        weights: MatRef<'a>,
        bias: Option<MatRef<'a>>,
        dst: MatMut<'a>,
        nstripes: usize,
    ) -> Result<Self> {
        if src.cols() != weights.cols() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![src.rows(), weights.cols()],
                got: vec![src.rows(), src.cols()],
            });
        }
        if dst.rows() != src.rows() || dst.cols() != weights.rows() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![src.rows(), weights.rows()],
                got: vec![dst.rows(), dst.cols()],
            });
        }
        let bias = match bias {
            Some(b) if !b.is_empty() => {
                if b.total() != dst.cols() {
                    return Err(TensorError::BiasShapeMismatch {
                        expected: dst.cols(),
                        got: b.total(),
                    });
                }
                let slice = b.as_continuous_slice().ok_or_else(|| {
                    TensorError::Other("bias must be a continuous vector".to_string())
                })?;
                Some(slice)
            }
            _ => None,
        };

        let mut fc = FullyConnected {
            src,
            weights,
            bias,
            dst,
            nstripes: nstripes.max(1),
            path: FastPath::Scalar,
        };
        fc.path = fc.usable(FastPath::detect());
        Ok(fc)
    }

    /// Forces a specific fast path.
    ///
    /// Fails if the host cannot run it. Vector paths still fall back to scalar
    /// when the weight rows carry no padding.
    pub fn with_fast_path(mut self, path: FastPath) -> Result<Self> {
        if !path.is_supported() {
            return Err(TensorError::UnsupportedFastPath(path.to_string()));
        }
        self.path = self.usable(path);
        Ok(self)
    }

    /// The path [`FullyConnected::run`] will use.
    pub fn fast_path(&self) -> FastPath {
        self.path
    }

    fn usable(&self, path: FastPath) -> FastPath {
        if path != FastPath::Scalar && !self.weights.has_padding(VEC_ALIGN) {
            log::debug!(
                "weight rows ({} cols, step {}) are not padded to {}; using scalar path",
                self.weights.cols(),
                self.weights.step(),
                VEC_ALIGN
            );
            return FastPath::Scalar;
        }
        path
    }

    /// Splits the output into `nstripes` disjoint regions and computes them on
    /// `executor`, returning once every stripe is done.
    pub fn run(self, executor: &dyn ParallelExecutor) {
        let FullyConnected {
            src,
            weights,
            bias,
            dst,
            nstripes,
            path,
        } = self;

        let num_output = dst.cols();
        let total = dst.rows() * num_output;
        if total == 0 {
            return;
        }

        let zeros;
        let bias = match bias {
            Some(b) => b,
            None => {
                zeros = vec![0.0f32; num_output];
                &zeros[..]
            }
        };

        let step = dst.step();
        let bounds: Vec<(Range<usize>, usize)> = partition::stripes(total, nstripes)
            .map(|range| {
                let end = dst.physical_offset(range.end);
                (range, end)
            })
            .collect();
        log::trace!(
            "affine kernel: {}x{} -> {} outputs, {} stripes, {} path",
            src.rows(),
            src.cols(),
            num_output,
            bounds.len(),
            path
        );

        let mut rest = dst.into_slice();
        let mut base = 0;
        let mut jobs: Vec<Job<'_>> = Vec::with_capacity(bounds.len());
        for (range, end) in bounds {
            let (region, tail) = std::mem::take(&mut rest).split_at_mut(end - base);
            rest = tail;
            let stripe = Stripe {
                range,
                base,
                step,
                num_output,
            };
            base = end;
            if stripe.range.is_empty() {
                continue;
            }
            jobs.push(Box::new(move || {
                stripe.compute(path, src, weights, bias, region)
            }));
        }
        executor.execute(jobs);
    }
}

/// A stripe's flat range and where its region starts in the output buffer.
#[derive(Debug, Clone)]
struct Stripe {
    range: Range<usize>,
    base: usize,
    step: usize,
    num_output: usize,
}

impl Stripe {
    fn compute(
        &self,
        path: FastPath,
        src: MatRef<'_>,
        weights: MatRef<'_>,
        bias: &[f32],
        region: &mut [f32],
    ) {
        for run in runs(self.range.clone(), self.num_output) {
            let start = run.sample * self.step + run.col - self.base;
            let cols = run.col..run.col + run.len;
            path.dot_rows(
                src.row(run.sample),
                weights.row_range(cols.start, cols.end),
                &bias[cols],
                &mut region[start..start + run.len],
            );
        }
    }
}
