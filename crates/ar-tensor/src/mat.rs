use crate::error::{Result, TensorError};

/// Rounds `n` up to the next multiple of `align`.
pub fn align_up(n: usize, align: usize) -> usize {
    debug_assert!(align > 0);
    n.div_ceil(align) * align
}

/// Smallest buffer that can hold `rows` rows of `cols` elements at stride `step`.
fn required_len(rows: usize, cols: usize, step: usize) -> usize {
    if rows == 0 {
        0
    } else {
        (rows - 1) * step + cols
    }
}

fn check_layout(len: usize, rows: usize, cols: usize, step: usize) -> Result<()> {
    if step < cols {
        return Err(TensorError::Other(format!(
            "row step {} is smaller than column count {}",
            step, cols
        )));
    }
    let need = required_len(rows, cols, step);
    if len < need {
        return Err(TensorError::ShapeMismatch {
            expected: vec![need],
            got: vec![len],
        });
    }
    Ok(())
}

/// An owned dense matrix.
///
/// `rows x cols` logical elements laid out row-major with a row stride
/// `step >= cols`. Elements in `cols..step` of each row are padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Mat {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
    step: usize,
}

impl Mat {
    /// Wraps a contiguous row-major buffer (`step == cols`).
    pub fn from_vec(data: Vec<f32>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(TensorError::ShapeMismatch {
                expected: vec![rows, cols],
                got: vec![data.len()],
            });
        }
        Ok(Mat {
            data,
            rows,
            cols,
            step: cols,
        })
    }

    /// A contiguous zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Mat {
            data: vec![0.0; rows * cols],
            rows,
            cols,
            step: cols,
        }
    }

    /// A zero matrix whose row stride is `cols` rounded up to `align`.
    ///
    /// Every row, including the last, owns its full padded stride.
    pub fn zeros_padded(rows: usize, cols: usize, align: usize) -> Self {
        let step = align_up(cols, align);
        Mat {
            data: vec![0.0; rows * step],
            rows,
            cols,
            step,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row stride in elements.
    pub fn step(&self) -> usize {
        self.step
    }

    /// True when rows are packed back to back.
    pub fn is_continuous(&self) -> bool {
        self.step == self.cols || self.rows <= 1
    }

    /// Logical elements of row `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.step..i * self.step + self.cols]
    }

    /// Logical elements of row `i`, mutably.
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let start = i * self.step;
        &mut self.data[start..start + self.cols]
    }

    /// The whole backing buffer, padding included.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn view(&self) -> MatRef<'_> {
        MatRef {
            data: &self.data,
            rows: self.rows,
            cols: self.cols,
            step: self.step,
        }
    }

    pub fn view_mut(&mut self) -> MatMut<'_> {
        MatMut {
            data: &mut self.data,
            rows: self.rows,
            cols: self.cols,
            step: self.step,
        }
    }
}

/// A borrowed read-only matrix view.
#[derive(Debug, Clone, Copy)]
pub struct MatRef<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
    step: usize,
}

impl<'a> MatRef<'a> {
    /// Contiguous view (`step == cols`).
    pub fn new(data: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        Self::with_step(data, rows, cols, cols)
    }

    /// Strided view. The buffer must hold `(rows - 1) * step + cols` elements.
    pub fn with_step(data: &'a [f32], rows: usize, cols: usize, step: usize) -> Result<Self> {
        check_layout(data.len(), rows, cols, step)?;
        Ok(MatRef {
            data,
            rows,
            cols,
            step,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Total number of logical elements.
    pub fn total(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Logical elements of row `i`.
    pub fn row(&self, i: usize) -> &'a [f32] {
        let start = i * self.step;
        &self.data[start..start + self.cols]
    }

    /// Row `i` read at `width >= cols` elements, reaching into the padding.
    ///
    /// # Panics
    /// Panics if the buffer does not extend that far; check
    /// [`MatRef::has_padding`] first.
    pub fn row_padded(&self, i: usize, width: usize) -> &'a [f32] {
        let start = i * self.step;
        &self.data[start..start + width]
    }

    /// True when every row can be read at `align_up(cols, align)` elements
    /// without leaving the buffer.
    pub fn has_padding(&self, align: usize) -> bool {
        let width = align_up(self.cols, align);
        width <= self.step && required_len(self.rows, width, self.step) <= self.data.len()
    }

    /// Rows `start..end` as a view sharing this one's stride.
    ///
    /// # Panics
    /// Panics if `start > end` or `end > rows`.
    pub fn row_range(&self, start: usize, end: usize) -> MatRef<'a> {
        assert!(start <= end && end <= self.rows, "row range out of bounds");
        let begin = (start * self.step).min(self.data.len());
        let stop = (end * self.step).min(self.data.len());
        MatRef {
            data: &self.data[begin..stop],
            rows: end - start,
            cols: self.cols,
            step: self.step,
        }
    }

    /// The logical elements of a single-row or contiguous matrix as one slice.
    pub fn as_continuous_slice(&self) -> Option<&'a [f32]> {
        if self.step == self.cols || self.rows <= 1 {
            Some(&self.data[..self.total()])
        } else {
            None
        }
    }
}

/// A borrowed mutable matrix view.
#[derive(Debug)]
pub struct MatMut<'a> {
    data: &'a mut [f32],
    rows: usize,
    cols: usize,
    step: usize,
}

impl<'a> MatMut<'a> {
    /// Contiguous view (`step == cols`).
    pub fn new(data: &'a mut [f32], rows: usize, cols: usize) -> Result<Self> {
        Self::with_step(data, rows, cols, cols)
    }

    /// Strided view. The buffer must hold `(rows - 1) * step + cols` elements.
    pub fn with_step(data: &'a mut [f32], rows: usize, cols: usize, step: usize) -> Result<Self> {
        check_layout(data.len(), rows, cols, step)?;
        Ok(MatMut {
            data,
            rows,
            cols,
            step,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let start = i * self.step;
        &mut self.data[start..start + self.cols]
    }

    /// Buffer offset of the `flat`-th logical element in row-major order.
    ///
    /// `flat == rows * cols` maps one past the last row and is clamped to the
    /// buffer length.
    pub fn physical_offset(&self, flat: usize) -> usize {
        if self.cols == 0 {
            return 0;
        }
        let offset = (flat / self.cols) * self.step + flat % self.cols;
        offset.min(self.data.len())
    }

    /// Consumes the view, yielding the raw buffer.
    pub fn into_slice(self) -> &'a mut [f32] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(13, 8), 16);
    }

    #[test]
    fn test_zeros_padded_layout() {
        let m = Mat::zeros_padded(3, 5, 8);
        assert_eq!(m.step(), 8);
        assert_eq!(m.as_slice().len(), 24);
        assert!(!m.is_continuous());
        assert!(m.view().has_padding(8));
        assert_eq!(m.view().row_padded(2, 8).len(), 8);
    }

    #[test]
    fn test_contiguous_has_no_padding() {
        let m = Mat::from_vec(vec![1.0; 10], 2, 5).unwrap();
        assert!(m.is_continuous());
        assert!(!m.view().has_padding(8));
        // already aligned columns need no extra space
        let m = Mat::zeros(2, 8);
        assert!(m.view().has_padding(8));
    }

    #[test]
    fn test_row_access_skips_padding() {
        let mut m = Mat::zeros_padded(2, 3, 4);
        m.row_mut(0).copy_from_slice(&[1.0, 2.0, 3.0]);
        m.row_mut(1).copy_from_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0]);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_row_range() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let m = MatRef::with_step(&data, 3, 3, 4).unwrap();
        let sub = m.row_range(1, 3);
        assert_eq!(sub.rows(), 2);
        assert_eq!(sub.row(0), &[4.0, 5.0, 6.0]);
        assert_eq!(sub.row(1), &[8.0, 9.0, 10.0]);
        assert_eq!(m.row_range(3, 3).rows(), 0);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let data = [0.0f32; 6];
        assert!(MatRef::new(&data, 2, 4).is_err());
        // last row does not need its padding
        assert!(MatRef::with_step(&data, 2, 2, 4).is_ok());
        assert!(MatRef::with_step(&data, 2, 4, 2).is_err());
    }

    #[test]
    fn test_physical_offset() {
        let mut data = [0.0f32; 11];
        let m = MatMut::with_step(&mut data, 3, 3, 4).unwrap();
        assert_eq!(m.physical_offset(0), 0);
        assert_eq!(m.physical_offset(2), 2);
        assert_eq!(m.physical_offset(3), 4);
        assert_eq!(m.physical_offset(8), 10);
        assert_eq!(m.physical_offset(9), 11);
    }

    #[test]
    fn test_continuous_slice() {
        let data = [1.0f32, 2.0, 3.0];
        let m = MatRef::new(&data, 1, 3).unwrap();
        assert_eq!(m.as_continuous_slice(), Some(&data[..]));
        let data = [0.0f32; 8];
        let m = MatRef::with_step(&data, 2, 3, 4).unwrap();
        assert!(m.as_continuous_slice().is_none());
    }
}
