//! Fully connected output layer
//!
//! `output = input * weights + bias`, no activation: the head of a
//! regressor is linear.

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Linear layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    /// Weight matrix (input_size x output_size)
    pub weights: Array2<f64>,
    /// Bias vector (output_size)
    pub biases: Array1<f64>,
}

impl Dense {
    /// Xavier/Glorot uniform initialization
    pub fn new<R: Rng>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (input_size + output_size) as f64).sqrt();

        Self {
            weights: Array2::random_using((input_size, output_size), Uniform::new(-limit, limit), rng),
            biases: Array1::zeros(output_size),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    /// `[batch, input_size]` -> `[batch, output_size]`
    pub fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        input.dot(&self.weights) + &self.biases
    }

    /// Returns (input_gradient, weight_gradient, bias_gradient)
    pub fn backward(
        &self,
        input: &Array2<f64>,
        output_gradient: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
        let weight_gradient = input.t().dot(output_gradient);
        let bias_gradient = output_gradient.sum_axis(Axis(0));
        let input_gradient = output_gradient.dot(&self.weights.t());

        (input_gradient, weight_gradient, bias_gradient)
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}
