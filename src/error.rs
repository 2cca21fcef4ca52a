//! Error types shared across the crate

use thiserror::Error;

/// Errors raised while preparing data, training or evaluating a forecaster
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Scaler fitted on a series whose min equals its max
    #[error("cannot scale a constant series (min = max = {value})")]
    DegenerateRange { value: f64 },

    /// Series too short for the requested window
    #[error("insufficient data: {available} points, need at least {required}")]
    InsufficientData { available: usize, required: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    /// Tensor rank or dimension inconsistent at a component boundary
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    #[error("invalid series: {0}")]
    InvalidSeries(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("scaler used before fit")]
    ScalerNotFitted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
}

impl ForecastError {
    pub(crate) fn shape(
        context: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ForecastError::ShapeMismatch {
            context,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
