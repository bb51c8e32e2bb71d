use crate::mat::MatRef;

/// `out[j] = bias[j] + dot(x, weights.row(j))` for every `j` in `out`.
///
/// `weights` must have `out.len()` rows of `x.len()` columns and `bias` must
/// hold `out.len()` values.
pub(crate) fn dot_rows(x: &[f32], weights: MatRef<'_>, bias: &[f32], out: &mut [f32]) {
    for (j, (dst, &b)) in out.iter_mut().zip(bias).enumerate() {
        let mut s = b;
        for (&xv, &wv) in x.iter().zip(weights.row(j)) {
            s += xv * wv;
        }
        *dst = s;
    }
}
