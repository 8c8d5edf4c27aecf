use crate::error::{Result, ValidError};
use crate::math::matrix::Matrix;

/// An owned group of samples scored in one forward pass.
///
/// `inputs` holds one sample per row; `labels[i]` is the ground-truth class
/// index of row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    inputs: Matrix,
    labels: Vec<usize>,
}

impl Batch {
    /// Fails with `BatchMismatch` if the row count differs from the label count.
    pub fn new(inputs: Matrix, labels: Vec<usize>) -> Result<Self> {
        if inputs.rows != labels.len() {
            return Err(ValidError::BatchMismatch { rows: inputs.rows, labels: labels.len() });
        }
        Ok(Self { inputs, labels })
    }

    /// Pairs `inputs` with `labels` whose lengths the caller already matched.
    pub(crate) fn from_parts(inputs: Matrix, labels: Vec<usize>) -> Self {
        debug_assert_eq!(inputs.rows, labels.len());
        Self { inputs, labels }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.labels.len()
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
