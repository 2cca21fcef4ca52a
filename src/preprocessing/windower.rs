//! Sliding-window sample construction

use super::dataset::SequenceDataset;
use super::normalizer::ScaledSeries;
use crate::error::{ForecastError, Result};
use ndarray::{s, Array2, Array3};
use serde::{Deserialize, Serialize};

/// Which part of the horizon becomes the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelMode {
    /// Every day of the horizon (multi-step, `horizon` outputs)
    AllSteps,
    /// Only the last day of the horizon (single-step, one output)
    LastStepOnly,
}

impl LabelMode {
    pub fn name(&self) -> &'static str {
        match self {
            LabelMode::AllSteps => "multi",
            LabelMode::LastStepOnly => "single",
        }
    }
}

/// Turns a scaled series into overlapping `(lookback, horizon)` samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Windower {
    /// Number of past steps in each input
    pub lookback: usize,
    /// Number of steps ahead covered by each label
    pub horizon: usize,
    pub mode: LabelMode,
}

impl Windower {
    /// Creates a windower
    ///
    /// # Example
    ///
    /// ```rust
    /// use price_gru::preprocessing::{LabelMode, Windower};
    ///
    /// // 20 days of history, predict each of the next 7 days
    /// let windower = Windower::new(20, 7, LabelMode::AllSteps).unwrap();
    /// assert_eq!(windower.num_windows(1000), 974);
    /// ```
    pub fn new(lookback: usize, horizon: usize, mode: LabelMode) -> Result<Self> {
        if lookback == 0 || horizon == 0 {
            return Err(ForecastError::InvalidConfig(format!(
                "lookback ({}) and horizon ({}) must be positive",
                lookback, horizon
            )));
        }

        Ok(Self {
            lookback,
            horizon,
            mode,
        })
    }

    /// Points spanned by one window
    pub fn window_len(&self) -> usize {
        self.lookback + self.horizon
    }

    /// Number of samples a series of `len` points yields
    pub fn num_windows(&self, len: usize) -> usize {
        (len + 1).saturating_sub(self.window_len())
    }

    /// Width of each label row
    pub fn output_dim(&self) -> usize {
        match self.mode {
            LabelMode::AllSteps => self.horizon,
            LabelMode::LastStepOnly => 1,
        }
    }

    /// Builds every window in increasing start order
    ///
    /// A series shorter than `lookback + horizon` gives an empty dataset.
    pub fn window(&self, series: &ScaledSeries) -> Result<SequenceDataset> {
        let n_windows = self.num_windows(series.len());
        let output_dim = self.output_dim();

        if n_windows == 0 {
            log::warn!(
                "{} points cannot fill a {}-step window, no samples produced",
                series.len(),
                self.window_len()
            );
            return Ok(SequenceDataset::empty(self.lookback, output_dim));
        }

        let values = series.values();
        let dates = series.dates();

        let mut x = Array3::zeros((n_windows, self.lookback, 1));
        let mut y = Array2::zeros((n_windows, output_dim));
        let mut label_dates = Vec::with_capacity(n_windows);

        for i in 0..n_windows {
            x.slice_mut(s![i, .., 0])
                .assign(&values.slice(s![i..i + self.lookback]));

            // labels start right after the lookback
            let first_label = match self.mode {
                LabelMode::AllSteps => i + self.lookback,
                LabelMode::LastStepOnly => i + self.lookback + self.horizon - 1,
            };
            let end = i + self.window_len();

            y.row_mut(i).assign(&values.slice(s![first_label..end]));
            label_dates.push(dates[first_label..end].to_vec());
        }

        log::debug!(
            "Built {} {} windows (lookback {}, horizon {})",
            n_windows,
            self.mode.name(),
            self.lookback,
            self.horizon
        );

        SequenceDataset::new(x, y, label_dates)
    }

    /// Input of shape `[1, lookback, 1]` from the most recent values
    pub fn latest_features(&self, series: &ScaledSeries) -> Result<Array3<f64>> {
        if series.len() < self.lookback {
            return Err(ForecastError::InsufficientData {
                available: series.len(),
                required: self.lookback,
            });
        }

        let start = series.len() - self.lookback;
        let mut x = Array3::zeros((1, self.lookback, 1));
        x.slice_mut(s![0, .., 0])
            .assign(&series.values().slice(s![start..]));

        Ok(x)
    }
}

/// Windows whose labels are all `horizon` trailing values
pub fn window_multi(series: &ScaledSeries, lookback: usize, horizon: usize) -> Result<SequenceDataset> {
    Windower::new(lookback, horizon, LabelMode::AllSteps)?.window(series)
}

/// Windows whose label is the value `horizon` steps past the lookback
pub fn window_single(series: &ScaledSeries, lookback: usize, horizon: usize) -> Result<SequenceDataset> {
    Windower::new(lookback, horizon, LabelMode::LastStepOnly)?.window(series)
}
