use rand::Rng;

use crate::{activation::activation::ActivationFunction, error::Result, math::matrix::Matrix};

#[derive(Debug, Clone)]
pub struct Layer {
    pub size: usize,
    pub input_size: usize,
    pub weights: Matrix, // input_size × size
    pub biases: Matrix,  // 1 × size
    pub activator: ActivationFunction,
    /// Last batch activations, recorded only outside inference mode.
    pub neurons: Option<Matrix>,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let std_dev = activation.init_std_dev(input_size);
        Layer {
            size,
            input_size,
            weights: Matrix::normal(input_size, size, std_dev, rng),
            biases: Matrix::zeros(1, size),
            activator: activation,
            neurons: None,
        }
    }

    /// Builds a layer from existing parameters, e.g. when loading a checkpoint.
    pub fn from_parts(weights: Matrix, biases: Matrix, activation: ActivationFunction) -> Layer {
        Layer {
            size: weights.cols,
            input_size: weights.rows,
            weights,
            biases,
            activator: activation,
            neurons: None,
        }
    }

    /// a = σ(XW + b) for a batch `X` with one sample per row.
    pub fn forward(&self, inputs: &Matrix) -> Result<Matrix> {
        let z = inputs.matmul(&self.weights)?.add_row(&self.biases)?;
        Ok(self.activator.apply(&z))
    }
}
