use super::scalar;
use crate::mat::{align_up, MatRef};

const LANES: usize = 4;
const COLS: usize = 4;

/// Four output columns per pass, four lanes per step (SSE on x86_64, NEON on
/// aarch64). Columns left over after the last full group go through the
/// scalar path.
///
/// Same contract as [`scalar::dot_rows`]. Every weight row must be readable
/// at `align_up(x.len(), 4)` elements.
pub(crate) fn dot_rows(x: &[f32], weights: MatRef<'_>, bias: &[f32], out: &mut [f32]) {
    let vecsize = x.len();
    let kmain = vecsize - vecsize % LANES;
    let width = align_up(vecsize, LANES);
    let mut xtail = [0.0f32; LANES];
    xtail[..vecsize - kmain].copy_from_slice(&x[kmain..]);

    let nw = out.len();
    let mut i = 0;
    while i + COLS <= nw {
        let rows = [
            weights.row_padded(i, width),
            weights.row_padded(i + 1, width),
            weights.row_padded(i + 2, width),
            weights.row_padded(i + 3, width),
        ];
        // SAFETY: `x` holds `kmain` elements read in full lanes, each row holds
        // `width >= kmain + LANES` elements whenever a tail exists, and the
        // bias/output windows are exactly COLS long.
        unsafe {
            arch::dot4(
                x,
                &xtail,
                kmain,
                rows,
                &bias[i..i + COLS],
                &mut out[i..i + COLS],
            )
        };
        i += COLS;
    }
    scalar::dot_rows(x, weights.row_range(i, nw), &bias[i..], &mut out[i..]);
}

#[cfg(target_arch = "x86_64")]
mod arch {
    use super::LANES;
    use std::arch::x86_64::*;

    /// # Safety
    /// See the call site in `dot_rows`.
    #[inline]
    pub(super) unsafe fn dot4(
        x: &[f32],
        xtail: &[f32; LANES],
        kmain: usize,
        rows: [&[f32]; 4],
        bias: &[f32],
        out: &mut [f32],
    ) {
        let mut s0 = _mm_setzero_ps();
        let mut s1 = _mm_setzero_ps();
        let mut s2 = _mm_setzero_ps();
        let mut s3 = _mm_setzero_ps();
        let xp = x.as_ptr();
        let [w0, w1, w2, w3] = rows.map(<[f32]>::as_ptr);

        let mut k = 0;
        while k < kmain {
            let v = _mm_loadu_ps(xp.add(k));
            s0 = _mm_add_ps(s0, _mm_mul_ps(v, _mm_loadu_ps(w0.add(k))));
            s1 = _mm_add_ps(s1, _mm_mul_ps(v, _mm_loadu_ps(w1.add(k))));
            s2 = _mm_add_ps(s2, _mm_mul_ps(v, _mm_loadu_ps(w2.add(k))));
            s3 = _mm_add_ps(s3, _mm_mul_ps(v, _mm_loadu_ps(w3.add(k))));
            k += LANES;
        }
        if kmain < x.len() {
            // weight tail comes from the zero padding
            let v = _mm_loadu_ps(xtail.as_ptr());
            s0 = _mm_add_ps(s0, _mm_mul_ps(v, _mm_loadu_ps(w0.add(kmain))));
            s1 = _mm_add_ps(s1, _mm_mul_ps(v, _mm_loadu_ps(w1.add(kmain))));
            s2 = _mm_add_ps(s2, _mm_mul_ps(v, _mm_loadu_ps(w2.add(kmain))));
            s3 = _mm_add_ps(s3, _mm_mul_ps(v, _mm_loadu_ps(w3.add(kmain))));
        }

        let s = _mm_add_ps(reduce_sum4(s0, s1, s2, s3), _mm_loadu_ps(bias.as_ptr()));
        _mm_storeu_ps(out.as_mut_ptr(), s);
    }

    /// Horizontal sums of four vectors, packed as `[sum(a), sum(b), sum(c), sum(d)]`.
    #[inline]
    unsafe fn reduce_sum4(a: __m128, b: __m128, c: __m128, d: __m128) -> __m128 {
        let ab = _mm_add_ps(_mm_unpacklo_ps(a, b), _mm_unpackhi_ps(a, b));
        let cd = _mm_add_ps(_mm_unpacklo_ps(c, d), _mm_unpackhi_ps(c, d));
        _mm_add_ps(_mm_movelh_ps(ab, cd), _mm_movehl_ps(cd, ab))
    }
}

#[cfg(target_arch = "aarch64")]
mod arch {
    use super::LANES;
    use std::arch::aarch64::*;

    /// # Safety
    /// See the call site in `dot_rows`.
    #[inline]
    pub(super) unsafe fn dot4(
        x: &[f32],
        xtail: &[f32; LANES],
        kmain: usize,
        rows: [&[f32]; 4],
        bias: &[f32],
        out: &mut [f32],
    ) {
        let mut s0 = vdupq_n_f32(0.0);
        let mut s1 = vdupq_n_f32(0.0);
        let mut s2 = vdupq_n_f32(0.0);
        let mut s3 = vdupq_n_f32(0.0);
        let xp = x.as_ptr();
        let [w0, w1, w2, w3] = rows.map(<[f32]>::as_ptr);

        let mut k = 0;
        while k < kmain {
            let v = vld1q_f32(xp.add(k));
            s0 = vfmaq_f32(s0, v, vld1q_f32(w0.add(k)));
            s1 = vfmaq_f32(s1, v, vld1q_f32(w1.add(k)));
            s2 = vfmaq_f32(s2, v, vld1q_f32(w2.add(k)));
            s3 = vfmaq_f32(s3, v, vld1q_f32(w3.add(k)));
            k += LANES;
        }
        if kmain < x.len() {
            let v = vld1q_f32(xtail.as_ptr());
            s0 = vfmaq_f32(s0, v, vld1q_f32(w0.add(kmain)));
            s1 = vfmaq_f32(s1, v, vld1q_f32(w1.add(kmain)));
            s2 = vfmaq_f32(s2, v, vld1q_f32(w2.add(kmain)));
            s3 = vfmaq_f32(s3, v, vld1q_f32(w3.add(kmain)));
        }

        let sums = [
            vaddvq_f32(s0),
            vaddvq_f32(s1),
            vaddvq_f32(s2),
            vaddvq_f32(s3),
        ];
        let s = vaddq_f32(vld1q_f32(sums.as_ptr()), vld1q_f32(bias.as_ptr()));
        vst1q_f32(out.as_mut_ptr(), s);
    }
}
