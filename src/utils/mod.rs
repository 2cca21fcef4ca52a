//! # Utilities
//!
//! Configuration, CSV I/O, logging setup and regression metrics.

pub mod config;
mod io;
mod logging;
mod metrics;

pub use config::{ForecastConfig, LoggingConfig, ModelConfig, ScalerFit, TrainingConfig, WindowConfig};
pub use io::{
    load_series_csv, parse_date, save_series_csv, DATE_FORMAT, DEFAULT_CLOSE_COLUMN,
    DEFAULT_DATE_COLUMN,
};
pub use logging::init_logging;
pub use metrics::{mae, mape, mse, r2_score, rmse};
