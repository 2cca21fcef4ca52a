//! GRU (Gated Recurrent Unit) regressor
//!
//! A stack of GRU cells reads the input sequence; the last hidden state of
//! the top layer goes through a linear layer. Gates follow
//!
//! ```text
//! z = σ(x·W_izᵀ + h·W_hzᵀ + b_z)
//! r = σ(x·W_irᵀ + h·W_hrᵀ + b_r)
//! n = tanh(x·W_inᵀ + (r ⊙ h)·W_hnᵀ + b_n)
//! h' = (1 - z) ⊙ n + z ⊙ h
//! ```
//!
//! Every forward pass starts from a zero hidden state. Gradients are
//! computed with backpropagation through time over the full sequence.

use super::config::GRUConfig;
use super::layers::Dense;
use super::optimizer::Optimizer;
use crate::error::{ForecastError, Result};
use ndarray::{s, Array1, Array2, Array3, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weight slots per cell (biases use the same base slot, in their own table)
const CELL_SLOTS: usize = 6;

/// GRU cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GRUCell {
    pub input_size: usize,
    pub hidden_size: usize,

    // update gate
    w_iz: Array2<f64>,
    w_hz: Array2<f64>,
    b_z: Array1<f64>,

    // reset gate
    w_ir: Array2<f64>,
    w_hr: Array2<f64>,
    b_r: Array1<f64>,

    // candidate
    w_in: Array2<f64>,
    w_hn: Array2<f64>,
    b_n: Array1<f64>,
}

/// Values saved by one cell step for the backward pass
#[derive(Debug, Clone)]
pub struct StepCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    z: Array2<f64>,
    r: Array2<f64>,
    n: Array2<f64>,
    rh: Array2<f64>,
}

/// Accumulated gradients for one cell
#[derive(Debug, Clone)]
pub struct GRUCellGradients {
    dw_iz: Array2<f64>,
    dw_hz: Array2<f64>,
    db_z: Array1<f64>,
    dw_ir: Array2<f64>,
    dw_hr: Array2<f64>,
    db_r: Array1<f64>,
    dw_in: Array2<f64>,
    dw_hn: Array2<f64>,
    db_n: Array1<f64>,
}

impl GRUCell {
    /// Weights uniform in `±1/sqrt(hidden_size)`, biases zero
    pub fn new<R: Rng>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let dist = Uniform::new(-limit, limit);

        Self {
            input_size,
            hidden_size,
            w_iz: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hz: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_z: Array1::zeros(hidden_size),
            w_ir: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hr: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_r: Array1::zeros(hidden_size),
            w_in: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hn: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_n: Array1::zeros(hidden_size),
        }
    }

    /// Zero hidden state for a batch
    pub fn init_hidden(&self, batch_size: usize) -> Array2<f64> {
        Array2::zeros((batch_size, self.hidden_size))
    }

    /// One timestep for a batch: `x` is `[batch, input_size]`, `h_prev` is
    /// `[batch, hidden_size]`
    pub fn forward(&self, x: &Array2<f64>, h_prev: &Array2<f64>) -> Array2<f64> {
        self.step(x, h_prev).0
    }

    /// One timestep, keeping what the backward pass needs
    pub fn step(&self, x: &Array2<f64>, h_prev: &Array2<f64>) -> (Array2<f64>, StepCache) {
        let z = sigmoid(x.dot(&self.w_iz.t()) + h_prev.dot(&self.w_hz.t()) + &self.b_z);
        let r = sigmoid(x.dot(&self.w_ir.t()) + h_prev.dot(&self.w_hr.t()) + &self.b_r);
        let rh = &r * h_prev;
        let n = (x.dot(&self.w_in.t()) + rh.dot(&self.w_hn.t()) + &self.b_n).mapv(f64::tanh);

        let h = &n + &(&z * &(h_prev - &n));

        let cache = StepCache {
            x: x.clone(),
            h_prev: h_prev.clone(),
            z,
            r,
            n,
            rh,
        };
        (h, cache)
    }

    /// Backward through one timestep
    ///
    /// `dh` is the gradient w.r.t. this step's output. Parameter gradients
    /// are added into `grads`; returns `(dx, dh_prev)`.
    pub fn backward_step(
        &self,
        cache: &StepCache,
        dh: &Array2<f64>,
        grads: &mut GRUCellGradients,
    ) -> (Array2<f64>, Array2<f64>) {
        let StepCache {
            x,
            h_prev,
            z,
            r,
            n,
            rh,
        } = cache;

        let dn = dh * &z.mapv(|v| 1.0 - v);
        let dz = dh * &(h_prev - n);
        let mut dh_prev = dh * z;

        // candidate pre-activation
        let da_n = dn * &n.mapv(|v| 1.0 - v * v);
        grads.dw_in += &da_n.t().dot(x);
        grads.dw_hn += &da_n.t().dot(rh);
        grads.db_n += &da_n.sum_axis(Axis(0));

        let d_rh = da_n.dot(&self.w_hn);
        let dr = &d_rh * h_prev;
        dh_prev += &(&d_rh * r);

        let da_r = dr * &r.mapv(|v| v * (1.0 - v));
        let da_z = dz * &z.mapv(|v| v * (1.0 - v));

        grads.dw_ir += &da_r.t().dot(x);
        grads.dw_hr += &da_r.t().dot(h_prev);
        grads.db_r += &da_r.sum_axis(Axis(0));

        grads.dw_iz += &da_z.t().dot(x);
        grads.dw_hz += &da_z.t().dot(h_prev);
        grads.db_z += &da_z.sum_axis(Axis(0));

        let dx = da_z.dot(&self.w_iz) + da_r.dot(&self.w_ir) + da_n.dot(&self.w_in);
        dh_prev += &(da_z.dot(&self.w_hz) + da_r.dot(&self.w_hr));

        (dx, dh_prev)
    }

    pub fn num_parameters(&self) -> usize {
        3 * (self.hidden_size * self.input_size + self.hidden_size * self.hidden_size + self.hidden_size)
    }

    fn apply<O: Optimizer>(&mut self, grads: &GRUCellGradients, slot: usize, optimizer: &mut O) {
        optimizer.update_weights(slot, &mut self.w_iz, &grads.dw_iz);
        optimizer.update_weights(slot + 1, &mut self.w_hz, &grads.dw_hz);
        optimizer.update_weights(slot + 2, &mut self.w_ir, &grads.dw_ir);
        optimizer.update_weights(slot + 3, &mut self.w_hr, &grads.dw_hr);
        optimizer.update_weights(slot + 4, &mut self.w_in, &grads.dw_in);
        optimizer.update_weights(slot + 5, &mut self.w_hn, &grads.dw_hn);

        optimizer.update_biases(slot, &mut self.b_z, &grads.db_z);
        optimizer.update_biases(slot + 1, &mut self.b_r, &grads.db_r);
        optimizer.update_biases(slot + 2, &mut self.b_n, &grads.db_n);
    }
}

impl GRUCellGradients {
    fn zeros(cell: &GRUCell) -> Self {
        let (h, i) = (cell.hidden_size, cell.input_size);
        Self {
            dw_iz: Array2::zeros((h, i)),
            dw_hz: Array2::zeros((h, h)),
            db_z: Array1::zeros(h),
            dw_ir: Array2::zeros((h, i)),
            dw_hr: Array2::zeros((h, h)),
            db_r: Array1::zeros(h),
            dw_in: Array2::zeros((h, i)),
            dw_hn: Array2::zeros((h, h)),
            db_n: Array1::zeros(h),
        }
    }

    fn sum_squares(&self) -> f64 {
        [&self.dw_iz, &self.dw_hz, &self.dw_ir, &self.dw_hr, &self.dw_in, &self.dw_hn]
            .iter()
            .map(|w| w.iter().map(|v| v * v).sum::<f64>())
            .sum::<f64>()
            + [&self.db_z, &self.db_r, &self.db_n]
                .iter()
                .map(|b| b.iter().map(|v| v * v).sum::<f64>())
                .sum::<f64>()
    }

    fn scale(&mut self, factor: f64) {
        for w in [
            &mut self.dw_iz,
            &mut self.dw_hz,
            &mut self.dw_ir,
            &mut self.dw_hr,
            &mut self.dw_in,
            &mut self.dw_hn,
        ] {
            *w *= factor;
        }
        for b in [&mut self.db_z, &mut self.db_r, &mut self.db_n] {
            *b *= factor;
        }
    }
}

/// Everything a training forward pass keeps: per layer, per timestep caches
#[derive(Debug, Clone)]
pub struct ForwardCache {
    steps: Vec<Vec<StepCache>>,
    last_hidden: Array2<f64>,
}

/// Gradients for all model parameters
#[derive(Debug, Clone)]
pub struct GRUGradients {
    cells: Vec<GRUCellGradients>,
    d_output_weights: Array2<f64>,
    d_output_biases: Array1<f64>,
}

impl GRUGradients {
    /// L2 norm over every parameter gradient
    pub fn global_norm(&self) -> f64 {
        let cells: f64 = self.cells.iter().map(|c| c.sum_squares()).sum();
        let head = self.d_output_weights.iter().map(|v| v * v).sum::<f64>()
            + self.d_output_biases.iter().map(|v| v * v).sum::<f64>();
        (cells + head).sqrt()
    }

    /// Rescales so the global norm is at most `max_norm`; returns the norm before clipping
    pub fn clip(&mut self, max_norm: f64) -> f64 {
        let norm = self.global_norm();
        if norm > max_norm && norm > 0.0 {
            let factor = max_norm / norm;
            for cell in &mut self.cells {
                cell.scale(factor);
            }
            self.d_output_weights *= factor;
            self.d_output_biases *= factor;
        }
        norm
    }
}

/// GRU model for time series forecasting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GRU {
    pub config: GRUConfig,
    cells: Vec<GRUCell>,
    output_layer: Dense,
}

impl GRU {
    /// Creates a single-layer model
    ///
    /// # Arguments
    ///
    /// * `input_size` - Number of input features
    /// * `hidden_size` - Hidden state width
    /// * `output_size` - Number of outputs
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        Self::from_config(GRUConfig::new(input_size, hidden_size, output_size))
    }

    /// Creates a model from a configuration
    pub fn from_config(config: GRUConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let layers = config.num_layers.max(1);
        let mut cells = Vec::with_capacity(layers);
        cells.push(GRUCell::new(config.input_size, config.hidden_size, &mut rng));
        for _ in 1..layers {
            cells.push(GRUCell::new(config.hidden_size, config.hidden_size, &mut rng));
        }

        let output_layer = Dense::new(config.hidden_size, config.output_size, &mut rng);

        Self {
            config,
            cells,
            output_layer,
        }
    }

    pub fn num_layers(&self) -> usize {
        self.cells.len()
    }

    pub fn output_size(&self) -> usize {
        self.config.output_size
    }

    pub fn num_parameters(&self) -> usize {
        self.cells.iter().map(|c| c.num_parameters()).sum::<usize>() + self.output_layer.num_parameters()
    }

    /// Forward pass: `[batch, seq_len, input_size]` -> `[batch, output_size]`
    pub fn forward(&self, x: &Array3<f64>) -> Result<Array2<f64>> {
        self.check_input(x)?;
        let (batch_size, seq_len, _) = x.dim();

        let mut layer_inputs: Vec<Array2<f64>> = (0..seq_len)
            .map(|t| x.slice(s![.., t, ..]).to_owned())
            .collect();

        for cell in &self.cells {
            let mut h = cell.init_hidden(batch_size);
            let mut outputs = Vec::with_capacity(seq_len);
            for input in &layer_inputs {
                h = cell.forward(input, &h);
                outputs.push(h.clone());
            }
            layer_inputs = outputs;
        }

        let last_hidden = match layer_inputs.last() {
            Some(h) => h.clone(),
            None => Array2::zeros((batch_size, self.config.hidden_size)),
        };

        Ok(self.output_layer.forward(&last_hidden))
    }

    /// Same as `forward`
    pub fn predict(&self, x: &Array3<f64>) -> Result<Array2<f64>> {
        self.forward(x)
    }

    /// Forward pass that records the caches needed by `backward`
    pub fn forward_train(&self, x: &Array3<f64>) -> Result<(Array2<f64>, ForwardCache)> {
        self.check_input(x)?;
        let (batch_size, seq_len, _) = x.dim();

        let mut layer_inputs: Vec<Array2<f64>> = (0..seq_len)
            .map(|t| x.slice(s![.., t, ..]).to_owned())
            .collect();
        let mut steps = Vec::with_capacity(self.cells.len());

        for cell in &self.cells {
            let mut h = cell.init_hidden(batch_size);
            let mut outputs = Vec::with_capacity(seq_len);
            let mut caches = Vec::with_capacity(seq_len);
            for input in &layer_inputs {
                let (h_next, cache) = cell.step(input, &h);
                outputs.push(h_next.clone());
                caches.push(cache);
                h = h_next;
            }
            steps.push(caches);
            layer_inputs = outputs;
        }

        let last_hidden = match layer_inputs.last() {
            Some(h) => h.clone(),
            None => Array2::zeros((batch_size, self.config.hidden_size)),
        };
        let output = self.output_layer.forward(&last_hidden);

        Ok((output, ForwardCache { steps, last_hidden }))
    }

    /// Backpropagation through time from the gradient of the loss w.r.t. the output
    pub fn backward(&self, cache: &ForwardCache, d_output: &Array2<f64>) -> GRUGradients {
        let (d_last, d_output_weights, d_output_biases) =
            self.output_layer.backward(&cache.last_hidden, d_output);

        let batch_size = d_output.nrows();
        let seq_len = cache.steps.first().map_or(0, |s| s.len());

        // gradient arriving at each timestep's output of the current layer
        let mut upstream: Vec<Array2<f64>> = (0..seq_len)
            .map(|_| Array2::zeros((batch_size, self.config.hidden_size)))
            .collect();
        if let Some(last) = upstream.last_mut() {
            *last = d_last;
        }

        let mut cell_grads: Vec<GRUCellGradients> =
            self.cells.iter().map(GRUCellGradients::zeros).collect();

        for (layer, cell) in self.cells.iter().enumerate().rev() {
            let mut dh_next = cell.init_hidden(batch_size);
            let mut d_inputs = vec![Array2::zeros((batch_size, cell.input_size)); seq_len];

            for t in (0..seq_len).rev() {
                let dh = &upstream[t] + &dh_next;
                let (dx, dh_prev) = cell.backward_step(&cache.steps[layer][t], &dh, &mut cell_grads[layer]);
                d_inputs[t] = dx;
                dh_next = dh_prev;
            }

            upstream = d_inputs;
        }

        GRUGradients {
            cells: cell_grads,
            d_output_weights,
            d_output_biases,
        }
    }

    /// Applies one optimizer update to every parameter
    pub fn apply_gradients<O: Optimizer>(&mut self, grads: &GRUGradients, optimizer: &mut O) {
        optimizer.begin_step();

        for (layer, (cell, cell_grads)) in self.cells.iter_mut().zip(&grads.cells).enumerate() {
            cell.apply(cell_grads, layer * CELL_SLOTS, &mut *optimizer);
        }

        let head_slot = self.cells.len() * CELL_SLOTS;
        optimizer.update_weights(head_slot, &mut self.output_layer.weights, &grads.d_output_weights);
        optimizer.update_biases(head_slot, &mut self.output_layer.biases, &grads.d_output_biases);
    }

    /// Mean squared error over all elements
    pub fn compute_loss(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        let diff = predictions - targets;
        diff.mapv(|x| x * x).mean().unwrap_or(0.0)
    }

    /// Gradient of `compute_loss` w.r.t. the predictions
    pub fn loss_gradient(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64> {
        let n = predictions.len().max(1) as f64;
        (predictions - targets) * (2.0 / n)
    }

    /// Saves the model
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = bincode::serialize(self)?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    /// Loads a model
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        let model: Self = bincode::deserialize(&data)?;
        Ok(model)
    }

    fn check_input(&self, x: &Array3<f64>) -> Result<()> {
        let (_, seq_len, features) = x.dim();
        if features != self.config.input_size || seq_len == 0 {
            return Err(ForecastError::shape(
                "GRU input",
                format!("[batch, seq_len > 0, {}]", self.config.input_size),
                format!("{:?}", x.shape()),
            ));
        }
        Ok(())
    }
}

fn sigmoid(x: Array2<f64>) -> Array2<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::optimizer::Adam;

    fn model(output_size: usize, layers: usize) -> GRU {
        GRU::from_config(GRUConfig::new(1, 4, output_size).with_layers(layers).with_seed(7))
    }

    fn sample_input(batch: usize, seq_len: usize) -> Array3<f64> {
        Array3::from_shape_fn((batch, seq_len, 1), |(b, t, _)| {
            ((b * seq_len + t) as f64 * 0.3).sin()
        })
    }

    #[test]
    fn test_gru_cell() {
        let mut rng = StdRng::seed_from_u64(0);
        let cell = GRUCell::new(5, 10, &mut rng);
        let x = Array2::zeros((3, 5));
        let h = cell.init_hidden(3);

        let h_next = cell.forward(&x, &h);

        assert_eq!(h_next.shape(), &[3, 10]);
        // zero input, zero state and zero biases keep the state at zero
        assert!(h_next.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_gru_forward_shape() {
        let gru = model(7, 2);
        let output = gru.forward(&sample_input(5, 20)).unwrap();
        assert_eq!(output.shape(), &[5, 7]);
    }

    #[test]
    fn test_forward_is_stateless() {
        let gru = model(3, 2);
        let x = sample_input(2, 6);
        let first = gru.forward(&x).unwrap();
        let second = gru.forward(&x).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = model(2, 2);
        let b = model(2, 2);
        let x = sample_input(3, 5);
        assert_eq!(a.forward(&x).unwrap(), b.forward(&x).unwrap());
    }

    #[test]
    fn test_rejects_wrong_input_width() {
        let gru = model(1, 1);
        let result = gru.forward(&Array3::zeros((2, 5, 3)));
        assert!(matches!(result, Err(ForecastError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_forward_train_matches_forward() {
        let gru = model(3, 2);
        let x = sample_input(4, 8);
        let (train_out, _) = gru.forward_train(&x).unwrap();
        let out = gru.forward(&x).unwrap();
        for (a, b) in train_out.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let gru = model(2, 2);
        let x = sample_input(3, 5);
        let y = Array2::from_shape_fn((3, 2), |(i, j)| 0.1 * i as f64 - 0.2 * j as f64);

        let (pred, cache) = gru.forward_train(&x).unwrap();
        let grads = gru.backward(&cache, &gru.loss_gradient(&pred, &y));

        let loss_with = |m: &GRU| {
            let p = m.forward(&x).unwrap();
            m.compute_loss(&p, &y)
        };
        let eps = 1e-6;

        // a recurrent weight in the bottom layer
        let mut plus = gru.clone();
        plus.cells[0].w_hz[[1, 2]] += eps;
        let mut minus = gru.clone();
        minus.cells[0].w_hz[[1, 2]] -= eps;
        let numeric = (loss_with(&plus) - loss_with(&minus)) / (2.0 * eps);
        assert!((numeric - grads.cells[0].dw_hz[[1, 2]]).abs() < 1e-6);

        // a candidate input weight in the top layer
        let mut plus = gru.clone();
        plus.cells[1].w_in[[0, 3]] += eps;
        let mut minus = gru.clone();
        minus.cells[1].w_in[[0, 3]] -= eps;
        let numeric = (loss_with(&plus) - loss_with(&minus)) / (2.0 * eps);
        assert!((numeric - grads.cells[1].dw_in[[0, 3]]).abs() < 1e-6);

        // reset gate bias
        let mut plus = gru.clone();
        plus.cells[0].b_r[1] += eps;
        let mut minus = gru.clone();
        minus.cells[0].b_r[1] -= eps;
        let numeric = (loss_with(&plus) - loss_with(&minus)) / (2.0 * eps);
        assert!((numeric - grads.cells[0].db_r[1]).abs() < 1e-6);

        // output head
        let mut plus = gru.clone();
        plus.output_layer.weights[[2, 1]] += eps;
        let mut minus = gru.clone();
        minus.output_layer.weights[[2, 1]] -= eps;
        let numeric = (loss_with(&plus) - loss_with(&minus)) / (2.0 * eps);
        assert!((numeric - grads.d_output_weights[[2, 1]]).abs() < 1e-6);
    }

    #[test]
    fn test_apply_gradients_reduces_loss() {
        let mut gru = model(1, 1);
        let x = sample_input(8, 6);
        let y = Array2::from_elem((8, 1), 0.5);
        let mut optimizer = Adam::new(0.01);

        let before = gru.compute_loss(&gru.forward(&x).unwrap(), &y);
        for _ in 0..20 {
            let (pred, cache) = gru.forward_train(&x).unwrap();
            let grads = gru.backward(&cache, &gru.loss_gradient(&pred, &y));
            gru.apply_gradients(&grads, &mut optimizer);
        }
        let after = gru.compute_loss(&gru.forward(&x).unwrap(), &y);

        assert!(after < before);
    }

    #[test]
    fn test_clip() {
        let gru = model(1, 1);
        let x = sample_input(4, 5);
        let y = Array2::from_elem((4, 1), 10.0);
        let (pred, cache) = gru.forward_train(&x).unwrap();
        let mut grads = gru.backward(&cache, &gru.loss_gradient(&pred, &y));

        let before = grads.clip(1e-3);
        assert!(before > 1e-3);
        assert!((grads.global_norm() - 1e-3).abs() < 1e-9);
    }

    #[test]
    fn test_save_load() {
        let gru = model(2, 2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gru.bin");

        gru.save(&path).unwrap();
        let loaded = GRU::load(&path).unwrap();

        let x = sample_input(2, 4);
        assert_eq!(gru.forward(&x).unwrap(), loaded.forward(&x).unwrap());
        assert_eq!(loaded.num_parameters(), gru.num_parameters());
    }

    #[test]
    fn test_parameter_count() {
        // layer 1: 3 * (4*1 + 4*4 + 4) = 72, layer 2: 3 * (16 + 16 + 4) = 108, head: 4*2 + 2 = 10
        assert_eq!(model(2, 2).num_parameters(), 190);
    }
}
