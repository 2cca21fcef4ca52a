//! # GRU model
//!
//! Stacked GRU regressor with a linear output layer, trained by
//! backpropagation through time with Adam.
//!
//! ## Example
//!
//! ```rust
//! use price_gru::model::{GRUConfig, GRU};
//! use ndarray::Array3;
//!
//! // 1 feature, 32 hidden units, 7 outputs, 2 layers
//! let config = GRUConfig::new(1, 32, 7).with_layers(2).with_seed(42);
//! let gru = GRU::from_config(config);
//!
//! let x = Array3::zeros((4, 20, 1));
//! let y = gru.forward(&x).unwrap();
//! assert_eq!(y.shape(), &[4, 7]);
//! ```

mod config;
mod gru;
mod layers;
mod optimizer;

pub use config::GRUConfig;
pub use gru::{ForwardCache, GRUCell, GRUCellGradients, GRUGradients, StepCache, GRU};
pub use layers::Dense;
pub use optimizer::{Adam, Optimizer};
