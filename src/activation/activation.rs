use serde::{Serialize, Deserialize};
use std::f64::consts::E;

use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    Tanh,
    /// Vector-valued: normalises each row of a batch into a probability
    /// distribution. See `apply`.
    Softmax,
}

impl ActivationFunction {
    /// Applies the activation to a whole batch (one sample per row).
    pub fn apply(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Softmax => {
                let mut out = z.clone();
                for i in 0..out.rows {
                    softmax_in_place(out.row_mut(i));
                }
                out
            }
            element_wise => z.map(|x| element_wise.function(x)),
        }
    }

    /// Element-wise activation. Softmax has no element-wise form and is
    /// handled by `apply`; here it passes values through unchanged.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Standard deviation used to initialise a weight matrix that feeds this
    /// activation: He for ReLU, Xavier for everything else.
    pub fn init_std_dev(&self, fan_in: usize) -> f64 {
        let fan_in = fan_in.max(1) as f64;
        match self {
            ActivationFunction::ReLU => (2.0 / fan_in).sqrt(),
            _ => (1.0 / fan_in).sqrt(),
        }
    }
}

/// Max-subtracted softmax over one sample's scores.
fn softmax_in_place(row: &mut [f64]) {
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    if sum > 0.0 {
        for x in row.iter_mut() {
            *x /= sum;
        }
    }
}
