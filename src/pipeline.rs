//! End-to-end forecasting run for one symbol and one label mode
//!
//! A [`Pipeline`] owns everything a run produces: the fitted scaler, the
//! trained model and its loss history. Two variants on the same series are
//! two independent pipelines.

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::evaluation::{Evaluation, Evaluator};
use crate::model::{GRUConfig, GRU};
use crate::preprocessing::{
    chronological_split, split_counts, validation_split, LabelMode, MinMaxScaler, ScaledSeries,
    Windower,
};
use crate::training::{Trainer, TrainingHistory};
use crate::utils::config::{ForecastConfig, ScalerFit};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Sample counts and scores of a training run
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub symbol: String,
    pub mode: LabelMode,
    pub total_samples: usize,
    pub train_samples: usize,
    /// Part of `train_samples` held out for loss monitoring
    pub validation_samples: usize,
    pub test_samples: usize,
    pub train: Evaluation,
    pub test: Evaluation,
}

impl fmt::Display for ForecastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}-step): {} samples, {} train / {} test",
            self.symbol,
            self.mode.name(),
            self.total_samples,
            self.train_samples,
            self.test_samples
        )?;
        writeln!(f, "{:>6} {:>12} {:>12} {:>10}", "step", "train RMSE", "test RMSE", "test R²")?;
        for (tr, te) in self.train.metrics().iter().zip(self.test.metrics()) {
            writeln!(
                f,
                "{:>6} {:>12.4} {:>12.4} {:>10.4}",
                tr.step, tr.rmse, te.rmse, te.r2
            )?;
        }
        Ok(())
    }
}

/// Fitted scaler, trained model and loss history of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    symbol: String,
    config: ForecastConfig,
    windower: Windower,
    scaler: MinMaxScaler,
    model: GRU,
    history: TrainingHistory,
}

impl Pipeline {
    /// Scales, windows, splits, trains and evaluates on `series`
    ///
    /// Fails with `InsufficientData` when the series cannot fill a single
    /// `lookback + horizon` window.
    pub fn train(
        series: &PriceSeries,
        config: &ForecastConfig,
        mode: LabelMode,
    ) -> Result<(Self, ForecastReport)> {
        config.validate()?;
        let w = &config.window;
        let windower = Windower::new(w.lookback, w.forecast_horizon, mode)?;

        if series.len() < windower.window_len() {
            return Err(ForecastError::InsufficientData {
                available: series.len(),
                required: windower.window_len(),
            });
        }

        info!(
            "{}: {} closes from {} to {}, {}-step variant",
            series.symbol(),
            series.len(),
            series.first_date().map(|d| d.to_string()).unwrap_or_default(),
            series.last_date().map(|d| d.to_string()).unwrap_or_default(),
            mode.name()
        );

        let total = windower.num_windows(series.len());
        let (train_count, _) = split_counts(total, w.test_fraction)?;
        if train_count == 0 {
            return Err(ForecastError::EmptyTrainingSet);
        }

        let scaled = match w.scaler_fit {
            ScalerFit::FullSeries => ScaledSeries::fit(series, w.scale_range)?,
            ScalerFit::TrainingPrefix => {
                // raw values touched by the last training window
                let covered = train_count + windower.window_len() - 1;
                let mut scaler = MinMaxScaler::new(w.scale_range)?;
                scaler.fit(&series.closes()[..covered])?;
                ScaledSeries::with_scaler(series, scaler)?
            }
        };

        let dataset = windower.window(&scaled)?;
        let (train, test) = chronological_split(&dataset, w.test_fraction)?;
        let (fit_set, validation) = validation_split(train.clone(), w.validation_fraction)?;

        info!(
            "Windows: {} total, {} train ({} fit / {} validation), {} test",
            dataset.len(),
            train.len(),
            fit_set.len(),
            validation.as_ref().map_or(0, |v| v.len()),
            test.len()
        );

        let mut gru_config = GRUConfig::new(1, config.model.hidden_dim, windower.output_dim())
            .with_layers(config.model.num_layers);
        gru_config.seed = config.model.seed;
        let mut model = GRU::from_config(gru_config);

        let history = Trainer::new(config.training.clone()).fit(&mut model, &fit_set, validation.as_ref())?;

        let evaluator = Evaluator::new(scaled.scaler());
        let train_eval = evaluator.evaluate(&model, &train)?;
        let test_eval = evaluator.evaluate(&model, &test)?;

        info!(
            "Mean RMSE: train {:.4}, test {:.4}",
            train_eval.mean_rmse(),
            test_eval.mean_rmse()
        );

        let report = ForecastReport {
            symbol: series.symbol().to_string(),
            mode,
            total_samples: dataset.len(),
            train_samples: train.len(),
            validation_samples: validation.as_ref().map_or(0, |v| v.len()),
            test_samples: test.len(),
            train: train_eval,
            test: test_eval,
        };

        let pipeline = Self {
            symbol: series.symbol().to_string(),
            config: config.clone(),
            windower,
            scaler: scaled.scaler().clone(),
            model,
            history,
        };

        Ok((pipeline, report))
    }

    /// Forecasts the values after the last point of `series`, in price units
    ///
    /// Multi-step pipelines return `horizon` values, one per following step.
    /// Single-step pipelines return one value, `horizon` steps ahead.
    pub fn forecast_next(&self, series: &PriceSeries) -> Result<Vec<f64>> {
        let scaled = ScaledSeries::with_scaler(series, self.scaler.clone())?;
        let x = self.windower.latest_features(&scaled)?;
        let prediction = self.model.predict(&x)?;
        let prices = self.scaler.inverse_transform(&prediction)?;
        Ok(prices.row(0).to_vec())
    }

    /// Scores the trained model on every window of `series`
    ///
    /// The series is scaled with the scaler fitted at training time.
    pub fn evaluate_series(&self, series: &PriceSeries) -> Result<Evaluation> {
        let scaled = ScaledSeries::with_scaler(series, self.scaler.clone())?;
        let dataset = self.windower.window(&scaled)?;
        Evaluator::new(&self.scaler).evaluate(&self.model, &dataset)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn mode(&self) -> LabelMode {
        self.windower.mode
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn windower(&self) -> &Windower {
        &self.windower
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn model(&self) -> &GRU {
        &self.model
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Saves the whole pipeline with bincode
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = bincode::serialize(self)?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(bincode::deserialize(&data)?)
    }
}
