//! GRU model configuration

use serde::{Deserialize, Serialize};

/// GRU regressor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GRUConfig {
    /// Number of input features per timestep
    pub input_size: usize,
    /// Width of every hidden layer
    pub hidden_size: usize,
    /// Number of outputs (horizon, or 1 for the single-step variant)
    pub output_size: usize,
    /// Number of stacked GRU layers
    pub num_layers: usize,
    /// Seed for weight initialization
    pub seed: Option<u64>,
}

impl GRUConfig {
    /// Creates a single-layer configuration
    ///
    /// # Arguments
    ///
    /// * `input_size` - Number of input features
    /// * `hidden_size` - Hidden state width
    /// * `output_size` - Number of outputs
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            output_size,
            num_layers: 1,
            seed: None,
        }
    }

    /// Sets the number of stacked layers
    pub fn with_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    /// Makes initialization deterministic
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for GRUConfig {
    fn default() -> Self {
        Self::new(1, 32, 1).with_layers(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = GRUConfig::new(1, 16, 7).with_layers(3).with_seed(42);

        assert_eq!(config.input_size, 1);
        assert_eq!(config.hidden_size, 16);
        assert_eq!(config.output_size, 7);
        assert_eq!(config.num_layers, 3);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_default_config() {
        let config = GRUConfig::default();
        assert_eq!(config.hidden_size, 32);
        assert_eq!(config.num_layers, 2);
        assert_eq!(config.seed, None);
    }
}
