//! Configuration management
//!
//! Run settings grouped by stage, loadable from TOML. Every section has
//! defaults, so a config file only needs the values it overrides.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which values the scaler's min/max are computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerFit {
    /// Whole series, test period included
    #[default]
    FullSeries,
    /// Only the raw values covered by training windows
    TrainingPrefix,
}

/// Windowing and split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Days of history fed to the model
    pub lookback: usize,
    /// Days ahead to predict
    pub forecast_horizon: usize,
    /// Fraction of samples held out for testing
    pub test_fraction: f64,
    /// Fraction of the training prefix monitored as validation (0 disables)
    pub validation_fraction: f64,
    /// Target range of the min-max scaler
    pub scale_range: (f64, f64),
    pub scaler_fit: ScalerFit,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            forecast_horizon: 7,
            test_fraction: 0.2,
            validation_fraction: 0.0,
            scale_range: (-1.0, 1.0),
            scaler_fit: ScalerFit::FullSeries,
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub hidden_dim: usize,
    pub num_layers: usize,
    /// Seed for weight initialization; random when absent
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_dim: 32,
            num_layers: 2,
            seed: None,
        }
    }
}

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub num_epochs: usize,
    pub learning_rate: f64,
    /// Global gradient-norm clip; no clipping when absent
    pub gradient_clip: Option<f64>,
    /// Log the loss at info level every N epochs
    pub log_every: usize,
    pub show_progress: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_epochs: 105,
            learning_rate: 0.01,
            gradient_clip: None,
            log_every: 10,
            show_progress: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ForecastConfig {
    pub window: WindowConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

impl ForecastConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ForecastConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file or use default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Falling back to default config ({}): {}",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.window.lookback = lookback;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.window.forecast_horizon = horizon;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.window.test_fraction = fraction;
        self
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.model.hidden_dim = hidden_dim;
        self
    }

    pub fn with_layers(mut self, num_layers: usize) -> Self {
        self.model.num_layers = num_layers;
        self
    }

    pub fn with_epochs(mut self, num_epochs: usize) -> Self {
        self.training.num_epochs = num_epochs;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.training.learning_rate = lr;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.model.seed = Some(seed);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.training.show_progress = false;
        self
    }

    /// Checks value ranges; every violation is an `InvalidConfig`
    pub fn validate(&self) -> Result<()> {
        let w = &self.window;
        let invalid = |msg: String| Err(ForecastError::InvalidConfig(msg));

        if w.lookback == 0 {
            return invalid("lookback must be positive".into());
        }
        if w.forecast_horizon == 0 {
            return invalid("forecast_horizon must be positive".into());
        }
        if !(w.test_fraction > 0.0 && w.test_fraction < 1.0) {
            return invalid(format!("test_fraction {} not in (0, 1)", w.test_fraction));
        }
        if !(w.validation_fraction >= 0.0 && w.validation_fraction < 1.0) {
            return invalid(format!(
                "validation_fraction {} not in [0, 1)",
                w.validation_fraction
            ));
        }
        let (low, high) = w.scale_range;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return invalid(format!("scale_range ({}, {}) is empty", low, high));
        }
        if self.model.hidden_dim == 0 || self.model.num_layers == 0 {
            return invalid("hidden_dim and num_layers must be positive".into());
        }
        if self.training.num_epochs == 0 {
            return invalid("num_epochs must be positive".into());
        }
        let lr = self.training.learning_rate;
        if !(lr.is_finite() && lr > 0.0) {
            return invalid(format!("learning_rate {} must be positive", lr));
        }
        if let Some(clip) = self.training.gradient_clip {
            if !(clip.is_finite() && clip > 0.0) {
                return invalid(format!("gradient_clip {} must be positive", clip));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ForecastConfig::default();
        assert_eq!(config.window.lookback, 20);
        assert_eq!(config.window.forecast_horizon, 7);
        assert_eq!(config.window.test_fraction, 0.2);
        assert_eq!(config.window.scale_range, (-1.0, 1.0));
        assert_eq!(config.model.hidden_dim, 32);
        assert_eq!(config.model.num_layers, 2);
        assert_eq!(config.training.num_epochs, 105);
        assert_eq!(config.training.learning_rate, 0.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = ForecastConfig::default().with_seed(7).with_lookback(30);
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: ForecastConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.window.lookback, 30);
        assert_eq!(parsed.model.seed, Some(7));
        assert_eq!(parsed.window.scaler_fit, ScalerFit::FullSeries);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: ForecastConfig = toml::from_str(
            "[window]\nlookback = 10\nscaler_fit = \"training_prefix\"\n\n[training]\nnum_epochs = 5\n",
        )
        .unwrap();
        assert_eq!(parsed.window.lookback, 10);
        assert_eq!(parsed.window.forecast_horizon, 7);
        assert_eq!(parsed.window.scaler_fit, ScalerFit::TrainingPrefix);
        assert_eq!(parsed.training.num_epochs, 5);
        assert_eq!(parsed.training.learning_rate, 0.01);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ForecastConfig::default().with_lookback(0).validate().is_err());
        assert!(ForecastConfig::default().with_test_fraction(1.0).validate().is_err());
        assert!(ForecastConfig::default().with_test_fraction(0.0).validate().is_err());
        assert!(ForecastConfig::default().with_learning_rate(-0.1).validate().is_err());

        let mut config = ForecastConfig::default();
        config.window.scale_range = (1.0, -1.0);
        assert!(matches!(config.validate(), Err(ForecastError::InvalidConfig(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.toml");

        let config = ForecastConfig::default().with_horizon(3).with_epochs(12);
        config.save(&path).unwrap();

        let loaded = ForecastConfig::load(&path).unwrap();
        assert_eq!(loaded.window.forecast_horizon, 3);
        assert_eq!(loaded.training.num_epochs, 12);
    }
}
