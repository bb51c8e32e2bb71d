use half::f16;

use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::mat::{MatMut, MatRef};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A tensor backed by CPU storage.
///
/// Holds contiguous, row-major data with an associated shape and dtype.
/// Compute happens on 2-D matrix views obtained with [`Tensor::as_mat`] and
/// [`Tensor::as_mat_mut`].
#[derive(Debug, Clone)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
    dtype: DType,
}

impl Tensor {
    /// Create a new tensor from f32 data and a shape.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn new(data: Vec<f32>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {:?} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Tensor {
            storage: CpuStorage::from_f32_vec(data),
            shape,
            dtype: DType::F32,
        }
    }

    /// Fallible counterpart of [`Tensor::new`].
    pub fn from_vec(data: Vec<f32>, shape: Shape) -> Result<Self> {
        if data.len() != shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor::new(data, shape))
    }

    /// Create a half-precision tensor.
    pub fn from_f16(data: Vec<f16>, shape: Shape) -> Result<Self> {
        if data.len() != shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor {
            storage: CpuStorage::from_f16_vec(data),
            shape,
            dtype: DType::F16,
        })
    }

    /// Create a zero-filled f32 tensor with the given shape.
    pub fn zeros(shape: Shape) -> Self {
        let n = shape.numel();
        Tensor {
            storage: CpuStorage::zeros(DType::F32, n),
            shape,
            dtype: DType::F32,
        }
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Returns the underlying data as an f32 slice.
    ///
    /// # Errors
    /// Returns `UnsupportedDType` if the tensor does not hold f32 data.
    pub fn data_f32(&self) -> Result<&[f32]> {
        self.storage
            .as_f32_slice()
            .map_err(|_| TensorError::UnsupportedDType(self.dtype))
    }

    /// Returns the underlying data as a mutable f32 slice.
    pub fn data_f32_mut(&mut self) -> Result<&mut [f32]> {
        let dtype = self.dtype;
        self.storage
            .as_f32_slice_mut()
            .map_err(|_| TensorError::UnsupportedDType(dtype))
    }

    /// Views the tensor as a `(outer, inner)` matrix flattened around `axis`.
    pub fn as_mat(&self, axis: isize) -> Result<MatRef<'_>> {
        let (rows, cols) = self.shape.flatten_at(axis)?;
        MatRef::new(self.data_f32()?, rows, cols)
    }

    /// Mutable `(rows, cols)` view over the tensor's storage.
    ///
    /// `rows * cols` must equal the element count.
    pub fn as_mat_mut(&mut self, rows: usize, cols: usize) -> Result<MatMut<'_>> {
        if rows * cols != self.shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: vec![rows, cols],
            });
        }
        MatMut::new(self.data_f32_mut()?, rows, cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tensor() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Shape::new(vec![2, 3]));
        assert_eq!(t.shape().ndim(), 2);
        assert_eq!(t.shape().dim(0), 2);
        assert_eq!(t.shape().dim(1), 3);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.data_f32().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_zeros() {
        let z = Tensor::zeros(Shape::new(vec![2, 3]));
        assert_eq!(z.data_f32().unwrap(), &[0.0; 6]);
    }

    #[test]
    fn test_from_vec_mismatch() {
        assert!(Tensor::from_vec(vec![1.0, 2.0], Shape::new(vec![3])).is_err());
    }

    #[test]
    fn test_f16_tensor_has_no_f32_view() {
        let t = Tensor::from_f16(vec![f16::ONE; 4], Shape::matrix(2, 2)).unwrap();
        assert_eq!(t.dtype(), DType::F16);
        assert!(matches!(
            t.data_f32(),
            Err(TensorError::UnsupportedDType(_))
        ));
        assert!(t.as_mat(1).is_err());
    }

    #[test]
    #[should_panic]
    fn test_new_shape_mismatch_panics() {
        let _t = Tensor::new(vec![1.0, 2.0], Shape::new(vec![3]));
    }

    #[test]
    fn test_as_mat_flattens_around_axis() {
        let t = Tensor::new((0..24).map(|v| v as f32).collect(), Shape::new(vec![2, 3, 4]));
        let m = t.as_mat(1).unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 12));
        assert_eq!(m.row(1)[0], 12.0);

        let m = t.as_mat(-1).unwrap();
        assert_eq!((m.rows(), m.cols()), (6, 4));
    }

    #[test]
    fn test_as_mat_mut() {
        let mut t = Tensor::zeros(Shape::new(vec![2, 2]));
        {
            let mut m = t.as_mat_mut(2, 2).unwrap();
            m.row_mut(1)[0] = 7.0;
        }
        assert_eq!(t.data_f32().unwrap(), &[0.0, 0.0, 7.0, 0.0]);
        assert!(t.as_mat_mut(3, 2).is_err());
    }
}
