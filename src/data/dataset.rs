use crate::error::{Result, ValidError};
use crate::math::matrix::Matrix;

/// A held-out dataset kept fully in memory.
///
/// An empty dataset is allowed here; scoring it is what fails.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    inputs: Matrix,
    labels: Vec<usize>,
}

impl InMemoryDataset {
    pub fn new(inputs: Matrix, labels: Vec<usize>) -> Result<Self> {
        if inputs.rows != labels.len() {
            return Err(ValidError::BatchMismatch { rows: inputs.rows, labels: labels.len() });
        }
        Ok(Self { inputs, labels })
    }

    /// Convenience constructor from per-sample rows, as produced by most loaders.
    pub fn from_samples(samples: &[Vec<f64>], labels: Vec<usize>) -> Result<Self> {
        Self::new(Matrix::from_rows(samples)?, labels)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn inputs(&self) -> &Matrix {
        &self.inputs
    }

    #[inline]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }
}
