use std::arch::x86_64::*;

use super::scalar;
use crate::mat::{align_up, MatRef};

const LANES: usize = 8;
const COLS: usize = 8;

/// Eight output columns per pass, eight lanes per step, with FMA.
///
/// Same contract as [`scalar::dot_rows`]. Every weight row must be readable
/// at `align_up(x.len(), 8)` elements.
///
/// # Safety
/// The CPU must support `avx2` and `fma`.
#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn dot_rows(x: &[f32], weights: MatRef<'_>, bias: &[f32], out: &mut [f32]) {
    let vecsize = x.len();
    let kmain = vecsize - vecsize % LANES;
    let width = align_up(vecsize, LANES);
    let mut xtail = [0.0f32; LANES];
    xtail[..vecsize - kmain].copy_from_slice(&x[kmain..]);

    let nw = out.len();
    let mut i = 0;
    while i + COLS <= nw {
        let rows: [&[f32]; COLS] = std::array::from_fn(|r| weights.row_padded(i + r, width));
        dot8(
            x,
            &xtail,
            kmain,
            &rows,
            &bias[i..i + COLS],
            &mut out[i..i + COLS],
        );
        i += COLS;
    }
    scalar::dot_rows(x, weights.row_range(i, nw), &bias[i..], &mut out[i..]);
}

#[inline]
#[target_feature(enable = "avx2,fma")]
unsafe fn dot8(
    x: &[f32],
    xtail: &[f32; LANES],
    kmain: usize,
    rows: &[&[f32]; COLS],
    bias: &[f32],
    out: &mut [f32],
) {
    let mut acc = [_mm256_setzero_ps(); COLS];
    let xp = x.as_ptr();

    let mut k = 0;
    while k < kmain {
        let v = _mm256_loadu_ps(xp.add(k));
        for (a, w) in acc.iter_mut().zip(rows) {
            *a = _mm256_fmadd_ps(v, _mm256_loadu_ps(w.as_ptr().add(k)), *a);
        }
        k += LANES;
    }
    if kmain < x.len() {
        let v = _mm256_loadu_ps(xtail.as_ptr());
        for (a, w) in acc.iter_mut().zip(rows) {
            *a = _mm256_fmadd_ps(v, _mm256_loadu_ps(w.as_ptr().add(kmain)), *a);
        }
    }

    let s = _mm256_add_ps(reduce_sum8(&acc), _mm256_loadu_ps(bias.as_ptr()));
    _mm256_storeu_ps(out.as_mut_ptr(), s);
}

/// Horizontal sums of eight vectors, packed in order into one vector.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn reduce_sum8(acc: &[__m256; COLS]) -> __m256 {
    let s01 = _mm256_hadd_ps(acc[0], acc[1]);
    let s23 = _mm256_hadd_ps(acc[2], acc[3]);
    let s45 = _mm256_hadd_ps(acc[4], acc[5]);
    let s67 = _mm256_hadd_ps(acc[6], acc[7]);
    // per 128-bit lane: partial sums of columns 0..4 and 4..8
    let s0123 = _mm256_hadd_ps(s01, s23);
    let s4567 = _mm256_hadd_ps(s45, s67);
    let lo = _mm256_permute2f128_ps(s0123, s4567, 0x20);
    let hi = _mm256_permute2f128_ps(s0123, s4567, 0x31);
    _mm256_add_ps(lo, hi)
}
