//! Optimization algorithms
//!
//! Parameters are addressed by a slot number so one optimizer instance can
//! keep separate moment estimates for every weight matrix and bias vector of
//! a model.

use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Optimizer trait for weight updates
pub trait Optimizer {
    /// Marks the start of one update over all parameters
    fn begin_step(&mut self);

    /// Update weights given gradients
    fn update_weights(&mut self, slot: usize, weights: &mut Array2<f64>, gradients: &Array2<f64>);

    /// Update biases given gradients
    fn update_biases(&mut self, slot: usize, biases: &mut Array1<f64>, gradients: &Array1<f64>);

    /// Reset optimizer state (for new training run)
    fn reset(&mut self);
}

/// Adam optimizer (Adaptive Moment Estimation)
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: i32,
    m_w: HashMap<usize, Array2<f64>>,
    v_w: HashMap<usize, Array2<f64>>,
    m_b: HashMap<usize, Array1<f64>>,
    v_b: HashMap<usize, Array1<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            m_w: HashMap::new(),
            v_w: HashMap::new(),
            m_b: HashMap::new(),
            v_b: HashMap::new(),
        }
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    /// Number of completed steps
    pub fn steps(&self) -> i32 {
        self.t
    }

    fn corrections(&self) -> (f64, f64) {
        let t = self.t.max(1);
        (1.0 - self.beta1.powi(t), 1.0 - self.beta2.powi(t))
    }
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update_weights(&mut self, slot: usize, weights: &mut Array2<f64>, gradients: &Array2<f64>) {
        let (c1, c2) = self.corrections();
        let (beta1, beta2) = (self.beta1, self.beta2);

        let m = self
            .m_w
            .entry(slot)
            .or_insert_with(|| Array2::zeros(weights.dim()));
        *m = &*m * beta1 + gradients * (1.0 - beta1);

        let v = self
            .v_w
            .entry(slot)
            .or_insert_with(|| Array2::zeros(weights.dim()));
        *v = &*v * beta2 + &(gradients * gradients) * (1.0 - beta2);

        let m_hat = &*m / c1;
        let v_hat = &*v / c2;

        *weights -= &(&m_hat * self.learning_rate / &(v_hat.mapv(f64::sqrt) + self.epsilon));
    }

    fn update_biases(&mut self, slot: usize, biases: &mut Array1<f64>, gradients: &Array1<f64>) {
        let (c1, c2) = self.corrections();
        let (beta1, beta2) = (self.beta1, self.beta2);

        let m = self
            .m_b
            .entry(slot)
            .or_insert_with(|| Array1::zeros(biases.len()));
        *m = &*m * beta1 + gradients * (1.0 - beta1);

        let v = self
            .v_b
            .entry(slot)
            .or_insert_with(|| Array1::zeros(biases.len()));
        *v = &*v * beta2 + &(gradients * gradients) * (1.0 - beta2);

        let m_hat = &*m / c1;
        let v_hat = &*v / c2;

        *biases -= &(&m_hat * self.learning_rate / &(v_hat.mapv(f64::sqrt) + self.epsilon));
    }

    fn reset(&mut self) {
        self.t = 0;
        self.m_w.clear();
        self.v_w.clear();
        self.m_b.clear();
        self.v_b.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_adam_first_step_is_learning_rate() {
        // bias correction makes the first step exactly lr * sign(g)
        let mut optimizer = Adam::new(0.01);
        let mut weights = Array2::ones((2, 2));
        let gradients = array![[0.5, -2.0], [3.0, -0.1]];

        optimizer.begin_step();
        optimizer.update_weights(0, &mut weights, &gradients);

        assert!((weights[[0, 0]] - 0.99).abs() < 1e-6);
        assert!((weights[[0, 1]] - 1.01).abs() < 1e-6);
        assert!((weights[[1, 0]] - 0.99).abs() < 1e-6);
        assert!((weights[[1, 1]] - 1.01).abs() < 1e-6);
    }

    #[test]
    fn test_adam_slots_are_independent() {
        let mut optimizer = Adam::new(0.1);
        let mut a = array![1.0, 1.0];
        let mut b = array![1.0, 1.0];

        for _ in 0..5 {
            optimizer.begin_step();
            optimizer.update_biases(0, &mut a, &array![1.0, 1.0]);
            optimizer.update_biases(1, &mut b, &array![-1.0, -1.0]);
        }

        assert!(a[0] < 1.0);
        assert!(b[0] > 1.0);
        assert!((a[0] - 1.0).abs() - (b[0] - 1.0).abs() < 1e-12);
        assert_eq!(optimizer.steps(), 5);
    }

    #[test]
    fn test_adam_reset() {
        let mut optimizer = Adam::new(0.01);
        let mut w = Array2::ones((1, 1));
        optimizer.begin_step();
        optimizer.update_weights(3, &mut w, &Array2::ones((1, 1)));
        optimizer.reset();
        assert_eq!(optimizer.steps(), 0);
    }
}
