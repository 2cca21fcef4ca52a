//! Inverse-scaled evaluation of a trained model

use super::table::{ForecastRow, ForecastTable};
use crate::error::{ForecastError, Result};
use crate::model::GRU;
use crate::preprocessing::{MinMaxScaler, SequenceDataset};
use crate::utils::{mae, mape, r2_score, rmse};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error metrics for one horizon step, in price units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    /// 1-based horizon step
    pub step: usize,
    pub rmse: f64,
    pub mae: f64,
    /// Percent
    pub mape: f64,
    pub r2: f64,
}

/// Predictions, actuals and per-step metrics for one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    predictions: Array2<f64>,
    actuals: Array2<f64>,
    metrics: Vec<StepMetrics>,
    tables: Vec<ForecastTable>,
}

impl Evaluation {
    /// Predictions in price units, shape `[n, output_dim]`
    pub fn predictions(&self) -> &Array2<f64> {
        &self.predictions
    }

    /// Actual prices, shape `[n, output_dim]`
    pub fn actuals(&self) -> &Array2<f64> {
        &self.actuals
    }

    pub fn metrics(&self) -> &[StepMetrics] {
        &self.metrics
    }

    /// One RMSE per output column
    pub fn rmse_per_step(&self) -> Vec<f64> {
        self.metrics.iter().map(|m| m.rmse).collect()
    }

    /// Average of the per-step RMSEs
    pub fn mean_rmse(&self) -> f64 {
        if self.metrics.is_empty() {
            return f64::NAN;
        }
        self.metrics.iter().map(|m| m.rmse).sum::<f64>() / self.metrics.len() as f64
    }

    pub fn tables(&self) -> &[ForecastTable] {
        &self.tables
    }

    /// Table for a 1-based horizon step
    pub fn table(&self, step: usize) -> Option<&ForecastTable> {
        self.tables.get(step.checked_sub(1)?)
    }

    pub fn num_samples(&self) -> usize {
        self.predictions.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.nrows() == 0
    }

    /// Writes one `{prefix}_step{n}.csv` per horizon step into `dir`
    pub fn save_tables<P: AsRef<Path>>(&self, dir: P, prefix: &str) -> Result<()> {
        std::fs::create_dir_all(dir.as_ref())?;
        for table in &self.tables {
            let path = dir
                .as_ref()
                .join(format!("{}_step{}.csv", prefix, table.step()));
            table.save_csv(path)?;
        }
        Ok(())
    }
}

/// Evaluates models against a dataset using the scaler the data was fitted with
pub struct Evaluator<'a> {
    scaler: &'a MinMaxScaler,
}

impl<'a> Evaluator<'a> {
    pub fn new(scaler: &'a MinMaxScaler) -> Self {
        Self { scaler }
    }

    /// Runs inference, inverse-scales and scores each horizon step
    ///
    /// An empty dataset yields an empty evaluation whose metrics are NaN.
    pub fn evaluate(&self, model: &GRU, dataset: &SequenceDataset) -> Result<Evaluation> {
        let output_dim = dataset.output_dim();
        if output_dim != model.output_size() {
            return Err(ForecastError::shape(
                "evaluation labels",
                format!("[n, {}]", model.output_size()),
                format!("{:?}", dataset.labels().shape()),
            ));
        }

        if dataset.is_empty() {
            log::warn!("Evaluating on an empty dataset");
            let metrics = (1..=output_dim)
                .map(|step| StepMetrics {
                    step,
                    rmse: f64::NAN,
                    mae: f64::NAN,
                    mape: f64::NAN,
                    r2: f64::NAN,
                })
                .collect();
            let tables = (1..=output_dim)
                .map(|step| ForecastTable::new(step, Vec::new()))
                .collect();
            return Ok(Evaluation {
                predictions: Array2::zeros((0, output_dim)),
                actuals: Array2::zeros((0, output_dim)),
                metrics,
                tables,
            });
        }

        let scaled_predictions = model.predict(dataset.features())?;
        let predictions = self.scaler.inverse_transform(&scaled_predictions)?;
        let actuals = self.scaler.inverse_transform(dataset.labels())?;

        let metrics: Vec<StepMetrics> = (0..output_dim)
            .map(|j| {
                let (t, p) = (actuals.column(j), predictions.column(j));
                StepMetrics {
                    step: j + 1,
                    rmse: rmse(t, p),
                    mae: mae(t, p),
                    mape: mape(t, p),
                    r2: r2_score(t, p),
                }
            })
            .collect();

        let label_dates = dataset.label_dates();
        let tables = (0..output_dim)
            .map(|j| {
                let rows = label_dates
                    .iter()
                    .enumerate()
                    .map(|(i, dates)| ForecastRow {
                        date: dates[j],
                        predicted: predictions[[i, j]],
                        actual: actuals[[i, j]],
                    })
                    .collect();
                ForecastTable::new(j + 1, rows)
            })
            .collect();

        for m in &metrics {
            log::debug!("Step {} RMSE: {:.4} MAE: {:.4}", m.step, m.rmse, m.mae);
        }

        Ok(Evaluation {
            predictions,
            actuals,
            metrics,
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PriceSeries;
    use crate::model::GRUConfig;
    use crate::preprocessing::{window_multi, window_single, ScaledSeries};
    use chrono::{Duration, NaiveDate};

    fn scaled(n: usize) -> ScaledSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let dates: Vec<_> = (0..n).map(|i| start + Duration::days(i as i64)).collect();
        let closes: Vec<_> = (0..n).map(|i| 100.0 + (i as f64 * 0.3).cos() * 8.0).collect();
        let series = PriceSeries::from_parts("EVAL", &dates, &closes).unwrap();
        ScaledSeries::fit(&series, (-1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_actuals_are_inverse_scaled() {
        let scaled = scaled(40);
        let dataset = window_multi(&scaled, 5, 3).unwrap();
        let model = GRU::from_config(GRUConfig::new(1, 4, 3).with_seed(9));

        let eval = Evaluator::new(scaled.scaler()).evaluate(&model, &dataset).unwrap();

        // first label of the first sample is raw close #5
        let expected = 100.0 + (5.0f64 * 0.3).cos() * 8.0;
        assert!((eval.actuals()[[0, 0]] - expected).abs() < 1e-9);
        assert_eq!(eval.metrics().len(), 3);
        assert_eq!(eval.tables().len(), 3);
        assert_eq!(eval.num_samples(), dataset.len());
    }

    #[test]
    fn test_tables_follow_label_dates() {
        let scaled = scaled(30);
        let dataset = window_multi(&scaled, 5, 3).unwrap();
        let model = GRU::from_config(GRUConfig::new(1, 4, 3).with_seed(9));

        let eval = Evaluator::new(scaled.scaler()).evaluate(&model, &dataset).unwrap();

        let step3 = eval.table(3).unwrap();
        assert_eq!(step3.step(), 3);
        assert_eq!(step3.len(), dataset.len());
        assert_eq!(step3.first_date(), Some(dataset.label_dates()[0][2]));
        assert!(eval.table(0).is_none());
        assert!(eval.table(4).is_none());
    }

    #[test]
    fn test_rmse_matches_table_errors() {
        let scaled = scaled(30);
        let dataset = window_single(&scaled, 5, 3).unwrap();
        let model = GRU::from_config(GRUConfig::new(1, 4, 1).with_seed(2));

        let eval = Evaluator::new(scaled.scaler()).evaluate(&model, &dataset).unwrap();

        let rows = eval.table(1).unwrap().rows();
        let mse = rows.iter().map(|r| r.error().powi(2)).sum::<f64>() / rows.len() as f64;
        assert!((eval.rmse_per_step()[0] - mse.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_dataset() {
        let scaled = scaled(6);
        let dataset = window_multi(&scaled, 5, 3).unwrap();
        let model = GRU::from_config(GRUConfig::new(1, 4, 3).with_seed(1));

        let eval = Evaluator::new(scaled.scaler()).evaluate(&model, &dataset).unwrap();
        assert!(eval.is_empty());
        assert!(eval.mean_rmse().is_nan());
        assert!(eval.tables().iter().all(|t| t.is_empty()));
    }

    #[test]
    fn test_output_dim_mismatch() {
        let scaled = scaled(30);
        let dataset = window_multi(&scaled, 5, 3).unwrap();
        let model = GRU::from_config(GRUConfig::new(1, 4, 1).with_seed(1));

        let result = Evaluator::new(scaled.scaler()).evaluate(&model, &dataset);
        assert!(matches!(result, Err(ForecastError::ShapeMismatch { .. })));
    }
}
