//! # Price GRU - recurrent forecasting of daily closing prices
//!
//! Library for forecasting a stock's closing price several days ahead with a
//! stacked GRU, built on `ndarray`.
//!
//! ## Modules
//!
//! - `data` - Closing-price series
//! - `preprocessing` - Scaling, windowing and chronological splits
//! - `model` - GRU regressor and the Adam optimizer
//! - `training` - Full-batch training loop
//! - `evaluation` - Inverse-scaled per-step metrics and forecast tables
//! - `pipeline` - One complete run per symbol and label mode
//! - `utils` - Configuration, CSV I/O, logging, metrics
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use price_gru::preprocessing::LabelMode;
//! use price_gru::utils::{init_logging, load_series_csv, ForecastConfig};
//! use price_gru::Pipeline;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging("info");
//!
//!     // 1. Load closes
//!     let series = load_series_csv("data/AAPL.csv", "AAPL", "Date", "Close")?;
//!
//!     // 2. 20 days back, 7 days ahead, 80/20 split, 105 epochs
//!     let config = ForecastConfig::default();
//!
//!     // 3. Train and evaluate the multi-step variant
//!     let (pipeline, report) = Pipeline::train(&series, &config, LabelMode::AllSteps)?;
//!     println!("{}", report);
//!
//!     // 4. Next week
//!     let forecast = pipeline.forecast_next(&series)?;
//!     println!("{:?}", forecast);
//!
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod training;
pub mod utils;

pub use data::{PricePoint, PriceSeries};
pub use error::{ForecastError, Result};
pub use model::{GRUConfig, GRU};
pub use pipeline::{ForecastReport, Pipeline};
pub use preprocessing::LabelMode;
