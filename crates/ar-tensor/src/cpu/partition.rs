use std::ops::Range;

/// Size of every stripe but possibly the last.
pub fn stripe_size(total: usize, nstripes: usize) -> usize {
    total.div_ceil(nstripes.max(1))
}

/// Flat output range owned by stripe `index` out of `nstripes`.
pub fn stripe_range(index: usize, nstripes: usize, total: usize) -> Range<usize> {
    let nstripes = nstripes.max(1);
    let size = stripe_size(total, nstripes);
    let start = (index * size).min(total);
    let end = if index + 1 >= nstripes {
        total
    } else {
        ((index + 1) * size).min(total)
    };
    start..end
}

/// All stripe ranges in order. Empty trailing stripes are kept so the count
/// always equals `nstripes`.
pub fn stripes(total: usize, nstripes: usize) -> impl Iterator<Item = Range<usize>> {
    let nstripes = nstripes.max(1);
    (0..nstripes).map(move |s| stripe_range(s, nstripes, total))
}

/// A contiguous piece of one sample's output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Row of the input/output matrix.
    pub sample: usize,
    /// First output column.
    pub col: usize,
    /// Number of output columns.
    pub len: usize,
}

impl Run {
    /// Flat offset of the run's first element.
    pub fn offset(&self, num_output: usize) -> usize {
        self.sample * num_output + self.col
    }
}

/// Iterator splitting a flat range into per-sample [`Run`]s.
#[derive(Debug, Clone)]
pub struct Runs {
    ofs: usize,
    end: usize,
    num_output: usize,
}

/// Walks `range` one sample at a time. A stripe may start or stop in the
/// middle of a sample's row, so it yields one [`Run`] per sample it touches.
pub fn runs(range: Range<usize>, num_output: usize) -> Runs {
    Runs {
        ofs: range.start,
        end: range.end,
        num_output,
    }
}

impl Iterator for Runs {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        if self.ofs >= self.end || self.num_output == 0 {
            return None;
        }
        let sample = self.ofs / self.num_output;
        let col = self.ofs - sample * self.num_output;
        let len = (self.num_output - col).min(self.end - self.ofs);
        self.ofs += len;
        Some(Run { sample, col, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_bounds() {
        // total 10 over 4 stripes: size 3, last stripe takes the remainder
        let all: Vec<_> = stripes(10, 4).collect();
        assert_eq!(all, vec![0..3, 3..6, 6..9, 9..10]);
    }

    #[test]
    fn test_more_stripes_than_elements() {
        let all: Vec<_> = stripes(3, 5).collect();
        assert_eq!(all, vec![0..1, 1..2, 2..3, 3..3, 3..3]);
    }

    #[test]
    fn test_zero_stripes_is_one() {
        assert_eq!(stripes(7, 0).collect::<Vec<_>>(), vec![0..7]);
    }

    #[test]
    fn test_stripes_are_a_disjoint_cover() {
        for outer in [0usize, 1, 2, 3, 5, 17] {
            for num_output in [1usize, 2, 3, 4, 7, 8, 33] {
                for nstripes in [1usize, 2, 3, 7, 8, 64, 100] {
                    let total = outer * num_output;
                    let mut hits = vec![0u32; total];
                    let mut last_end = 0;
                    for range in stripes(total, nstripes) {
                        assert_eq!(range.start, last_end, "stripes must be contiguous");
                        last_end = range.end;
                        for run in runs(range, num_output) {
                            assert!(run.len > 0);
                            assert!(run.col + run.len <= num_output);
                            assert!(run.sample < outer);
                            let ofs = run.offset(num_output);
                            for h in &mut hits[ofs..ofs + run.len] {
                                *h += 1;
                            }
                        }
                    }
                    assert_eq!(last_end, total);
                    assert!(
                        hits.iter().all(|&h| h == 1),
                        "outer={} num_output={} nstripes={}",
                        outer,
                        num_output,
                        nstripes
                    );
                }
            }
        }
    }

    #[test]
    fn test_runs_cross_sample_boundary() {
        // num_output 4, stripe covering flat 2..9 spans three samples
        let got: Vec<_> = runs(2..9, 4).collect();
        assert_eq!(
            got,
            vec![
                Run { sample: 0, col: 2, len: 2 },
                Run { sample: 1, col: 0, len: 4 },
                Run { sample: 2, col: 0, len: 1 },
            ]
        );
    }

    #[test]
    fn test_runs_empty_range() {
        assert_eq!(runs(5..5, 3).count(), 0);
        assert_eq!(runs(0..4, 0).count(), 0);
    }
}
