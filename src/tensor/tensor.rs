use std::fmt;

use crate::error::{ConvNetError, Result};

use super::tensor_shape::TensorShape;

/// Dense depth x height x width volume of `f64` values.
///
/// Every coordinate is given as `(depth, row, col)`. The checked accessors
/// (`get`, `set`, `add`) report out-of-range coordinates as
/// [`ConvNetError::IndexOutOfBounds`]; the layers use the crate-internal
/// `at`/`at_mut` once the shapes of a call have been validated.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: TensorShape,
    values: Vec<f64>,
}

impl Tensor {
    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self> {
        Self::from_shape(TensorShape::new(width, height, depth))
    }

    pub fn from_shape(shape: TensorShape) -> Result<Self> {
        shape.validate()?;

        Ok(Self {
            shape,
            values: vec![0.0; shape.num_elements()],
        })
    }

    /// Wraps `values`, which must already be in the interleaved layout
    /// (depth fastest, then column, then row).
    pub fn from_vec(shape: TensorShape, values: Vec<f64>) -> Result<Self> {
        shape.validate()?;

        if values.len() != shape.num_elements() {
            return Err(ConvNetError::DataLengthMismatch {
                expected: shape.num_elements(),
                actual: values.len(),
            });
        }

        Ok(Self { shape, values })
    }

    /// Builds a tensor from nested `[depth][row][col]` data.
    pub fn from_slices(slices: &[Vec<Vec<f64>>]) -> Result<Self> {
        let depth = slices.len();
        let height = slices.first().map_or(0, |s| s.len());
        let width = slices
            .first()
            .and_then(|s| s.first())
            .map_or(0, |r| r.len());

        let mut tensor = Self::new(width, height, depth)?;

        for (d, slice) in slices.iter().enumerate() {
            if slice.len() != height {
                return Err(ConvNetError::DataLengthMismatch {
                    expected: height,
                    actual: slice.len(),
                });
            }
            for (i, row) in slice.iter().enumerate() {
                if row.len() != width {
                    return Err(ConvNetError::DataLengthMismatch {
                        expected: width,
                        actual: row.len(),
                    });
                }
                for (j, &value) in row.iter().enumerate() {
                    *tensor.at_mut(d, i, j) = value;
                }
            }
        }

        Ok(tensor)
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    pub fn get(&self, depth: usize, row: usize, col: usize) -> Result<f64> {
        self.check_index(depth, row, col)?;
        Ok(self.at(depth, row, col))
    }

    pub fn set(&mut self, depth: usize, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_index(depth, row, col)?;
        *self.at_mut(depth, row, col) = value;
        Ok(())
    }

    pub fn add(&mut self, depth: usize, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_index(depth, row, col)?;
        *self.at_mut(depth, row, col) += value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn fill(&mut self, value: f64) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Element-wise product summed over the whole volume.
    pub fn dot(&self, other: &Tensor) -> Result<f64> {
        if self.shape != other.shape {
            return Err(ConvNetError::ShapeMismatch {
                expected: self.shape,
                actual: other.shape,
            });
        }

        Ok(self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum())
    }

    pub(crate) fn at(&self, depth: usize, row: usize, col: usize) -> f64 {
        self.values[self.shape.offset(depth, row, col)]
    }

    pub(crate) fn at_mut(&mut self, depth: usize, row: usize, col: usize) -> &mut f64 {
        let idx = self.shape.offset(depth, row, col);
        &mut self.values[idx]
    }

    fn check_index(&self, depth: usize, row: usize, col: usize) -> Result<()> {
        if !self.shape.contains(depth, row, col) {
            return Err(ConvNetError::IndexOutOfBounds {
                depth,
                row,
                col,
                shape: self.shape,
            });
        }
        Ok(())
    }
}

// One block per depth slice, `height` lines of `width` values, blank line between slices
impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in 0..self.shape.depth {
            for i in 0..self.shape.height {
                for j in 0..self.shape.width {
                    if j > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", self.at(d, i, j))?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tensor_is_zeroed() {
        let t = Tensor::new(3, 2, 4).unwrap();
        assert_eq!(t.shape(), TensorShape::new(3, 2, 4));
        assert_eq!(t.as_slice().len(), 24);
        assert!(t.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn both_constructors_agree() {
        let a = Tensor::new(5, 4, 3).unwrap();
        let b = Tensor::from_shape(TensorShape::new(5, 4, 3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn set_then_get_does_not_alias() {
        let mut t = Tensor::new(4, 4, 1).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                t.set(0, i, j, (i * 4 + j) as f64).unwrap();
            }
        }
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(t.get(0, i, j).unwrap(), (i * 4 + j) as f64);
            }
        }
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let mut t = Tensor::new(2, 3, 4).unwrap();

        assert!(matches!(
            t.get(4, 0, 0),
            Err(ConvNetError::IndexOutOfBounds { depth: 4, .. })
        ));
        assert!(t.get(0, 3, 0).is_err());
        assert!(t.set(0, 0, 2, 1.0).is_err());
        assert!(t.add(0, 0, 2, 1.0).is_err());
        assert!(t.get(3, 2, 1).is_ok());
    }

    #[test]
    fn oversized_tensor_is_an_error() {
        assert!(matches!(
            Tensor::new(usize::MAX, 2, 1),
            Err(ConvNetError::DegenerateConfig(_))
        ));
        assert!(Tensor::from_vec(TensorShape::new(usize::MAX, 2, 1), vec![]).is_err());
    }

    #[test]
    fn from_vec_checks_length() {
        let shape = TensorShape::new(2, 2, 1);
        assert!(Tensor::from_vec(shape, vec![1.0; 4]).is_ok());
        assert_eq!(
            Tensor::from_vec(shape, vec![1.0; 3]),
            Err(ConvNetError::DataLengthMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn from_slices_uses_depth_row_col() {
        let t = Tensor::from_slices(&[
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            vec![vec![7.0, 8.0, 9.0], vec![10.0, 11.0, 12.0]],
        ])
        .unwrap();

        assert_eq!(t.shape(), TensorShape::new(3, 2, 2));
        assert_eq!(t.get(0, 1, 2).unwrap(), 6.0);
        assert_eq!(t.get(1, 0, 1).unwrap(), 8.0);
    }

    #[test]
    fn from_slices_rejects_ragged_rows() {
        let ragged = Tensor::from_slices(&[vec![vec![1.0, 2.0], vec![3.0]]]);
        assert!(matches!(ragged, Err(ConvNetError::DataLengthMismatch { .. })));
    }

    #[test]
    fn display_prints_slices() {
        let t = Tensor::from_slices(&[vec![vec![1.0, 2.0]], vec![vec![3.0, 4.0]]]).unwrap();
        assert_eq!(t.to_string(), "1 2\n\n3 4\n\n");
    }

    #[test]
    fn dot_requires_matching_shapes() {
        let a = Tensor::from_vec(TensorShape::new(2, 1, 1), vec![1.0, 2.0]).unwrap();
        let b = Tensor::from_vec(TensorShape::new(2, 1, 1), vec![3.0, 4.0]).unwrap();
        assert_eq!(a.dot(&b).unwrap(), 11.0);
        assert!(a.dot(&Tensor::new(1, 2, 1).unwrap()).is_err());
    }
}
