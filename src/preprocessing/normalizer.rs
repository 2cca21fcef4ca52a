//! Min-max scaling of a closing-price series

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use ndarray::{Array, Array1, Dimension};
use serde::{Deserialize, Serialize};

/// Affine scaler mapping `[min, max]` of the fitted values onto `feature_range`
///
/// Fit once per run. Every transform and inverse afterwards reuses the same
/// min/max, so predictions can be mapped back to prices consistently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    min: Option<f64>,
    max: Option<f64>,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self {
            feature_range: (-1.0, 1.0),
            min: None,
            max: None,
        }
    }
}

impl MinMaxScaler {
    /// Creates an unfitted scaler for the given target range
    pub fn new(feature_range: (f64, f64)) -> Result<Self> {
        let (low, high) = feature_range;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ForecastError::InvalidConfig(format!(
                "scale range ({}, {}) is empty",
                low, high
            )));
        }

        Ok(Self {
            feature_range,
            min: None,
            max: None,
        })
    }

    /// Computes min and max of `values`
    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(ForecastError::InsufficientData {
                available: 0,
                required: 1,
            });
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max == min {
            return Err(ForecastError::DegenerateRange { value: min });
        }

        self.min = Some(min);
        self.max = Some(max);
        Ok(())
    }

    pub fn transform(&self, values: &[f64]) -> Result<Array1<f64>> {
        let (min, max) = self.bounds()?;
        let (low, high) = self.feature_range;
        let scale = (high - low) / (max - min);

        Ok(values.iter().map(|&v| low + (v - min) * scale).collect())
    }

    pub fn fit_transform(&mut self, values: &[f64]) -> Result<Array1<f64>> {
        self.fit(values)?;
        self.transform(values)
    }

    /// Maps scaled values of any shape back to price units
    pub fn inverse_transform<D: Dimension>(&self, scaled: &Array<f64, D>) -> Result<Array<f64, D>> {
        let (min, max) = self.bounds()?;
        let (low, high) = self.feature_range;
        let scale = (max - min) / (high - low);

        Ok(scaled.mapv(|s| min + (s - low) * scale))
    }

    pub fn inverse_value(&self, scaled: f64) -> Result<f64> {
        let (min, max) = self.bounds()?;
        let (low, high) = self.feature_range;
        Ok(min + (scaled - low) * (max - min) / (high - low))
    }

    pub fn is_fitted(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    pub fn feature_range(&self) -> (f64, f64) {
        self.feature_range
    }

    pub fn data_min(&self) -> Option<f64> {
        self.min
    }

    pub fn data_max(&self) -> Option<f64> {
        self.max
    }

    fn bounds(&self) -> Result<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Ok((min, max)),
            _ => Err(ForecastError::ScalerNotFitted),
        }
    }
}

/// A price series in scaled units, together with the scaler that produced it
#[derive(Debug, Clone)]
pub struct ScaledSeries {
    dates: Vec<NaiveDate>,
    values: Array1<f64>,
    scaler: MinMaxScaler,
}

impl ScaledSeries {
    /// Fits a new scaler on the whole series and scales it
    pub fn fit(series: &PriceSeries, feature_range: (f64, f64)) -> Result<Self> {
        let mut scaler = MinMaxScaler::new(feature_range)?;
        scaler.fit(&series.closes())?;
        Self::with_scaler(series, scaler)
    }

    /// Scales the series with an already fitted scaler
    pub fn with_scaler(series: &PriceSeries, scaler: MinMaxScaler) -> Result<Self> {
        let values = scaler.transform(&series.closes())?;
        Ok(Self {
            dates: series.dates(),
            values,
            scaler,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_range() {
        let mut scaler = MinMaxScaler::default();
        let scaled = scaler.fit_transform(&[10.0, 20.0, 15.0, 30.0]).unwrap();

        assert_eq!(scaled, array![-1.0, 0.0, -0.5, 1.0]);
        assert_eq!(scaler.data_min(), Some(10.0));
        assert_eq!(scaler.data_max(), Some(30.0));
    }

    #[test]
    fn test_custom_range() {
        let mut scaler = MinMaxScaler::new((0.0, 1.0)).unwrap();
        let scaled = scaler.fit_transform(&[2.0, 4.0, 6.0]).unwrap();
        assert_eq!(scaled, array![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let values: Vec<f64> = (0..200)
            .map(|i| 12.5 + (i as f64 * 0.37).sin() * 4.0 + i as f64 * 0.01)
            .collect();

        let mut scaler = MinMaxScaler::default();
        let scaled = scaler.fit_transform(&values).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (a, b) in values.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_inverse_2d() {
        let mut scaler = MinMaxScaler::default();
        scaler.fit(&[0.0, 10.0]).unwrap();

        let restored = scaler.inverse_transform(&array![[-1.0, 1.0], [0.0, 0.5]]).unwrap();
        assert_eq!(restored, array![[0.0, 10.0], [5.0, 7.5]]);
        assert_eq!(scaler.inverse_value(0.0).unwrap(), 5.0);
    }

    #[test]
    fn test_constant_series_is_degenerate() {
        let mut scaler = MinMaxScaler::default();
        let result = scaler.fit(&[3.0, 3.0, 3.0]);
        assert!(matches!(result, Err(ForecastError::DegenerateRange { .. })));
        assert!(!scaler.is_fitted());
    }

    #[test]
    fn test_unfitted_scaler_errors() {
        let scaler = MinMaxScaler::default();
        assert!(matches!(scaler.transform(&[1.0]), Err(ForecastError::ScalerNotFitted)));
        assert!(matches!(
            scaler.inverse_transform(&array![0.0]),
            Err(ForecastError::ScalerNotFitted)
        ));
    }

    #[test]
    fn test_invalid_range() {
        assert!(MinMaxScaler::new((1.0, 1.0)).is_err());
        assert!(MinMaxScaler::new((1.0, -1.0)).is_err());
    }

    #[test]
    fn test_scaled_series_keeps_dates() {
        let dates: Vec<_> = (1..=4)
            .map(|d| NaiveDate::from_ymd_opt(2023, 3, d).unwrap())
            .collect();
        let series = PriceSeries::from_parts("SNAP", &dates, &[1.0, 2.0, 3.0, 5.0]).unwrap();

        let scaled = ScaledSeries::fit(&series, (-1.0, 1.0)).unwrap();
        assert_eq!(scaled.len(), 4);
        assert_eq!(scaled.dates(), dates.as_slice());
        assert_eq!(scaled.values()[0], -1.0);
        assert_eq!(scaled.values()[3], 1.0);
        assert!(scaled.scaler().is_fitted());
    }
}
