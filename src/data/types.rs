//! Price series types

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Ordered closing-price series for a single symbol
///
/// Dates are strictly increasing. Gaps (weekends, holidays) are kept as they
/// come from the source; nothing is resampled or filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, rejecting unordered dates and non-finite prices
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() {
                return Err(ForecastError::InvalidSeries(format!(
                    "non-finite close {} at {}",
                    point.close, point.date
                )));
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(ForecastError::InvalidSeries(format!(
                    "dates not strictly increasing: {} followed by {}",
                    points[i - 1].date,
                    point.date
                )));
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    /// Builds a series from parallel date and price slices
    pub fn from_parts(symbol: impl Into<String>, dates: &[NaiveDate], closes: &[f64]) -> Result<Self> {
        if dates.len() != closes.len() {
            return Err(ForecastError::shape(
                "PriceSeries::from_parts",
                format!("{} closes", dates.len()),
                format!("{} closes", closes.len()),
            ));
        }

        let points = dates
            .iter()
            .zip(closes)
            .map(|(&date, &close)| PricePoint::new(date, close))
            .collect();

        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Returns the sub-series with `start <= date <= end`
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let points = self
            .points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect();

        PriceSeries {
            symbol: self.symbol.clone(),
            points,
        }
    }

    /// Returns the last `n` points (or the whole series if shorter)
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.points.len().saturating_sub(n);
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self.points[start..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_series_accepts_gaps() {
        let series = PriceSeries::from_parts("PLUG", &[day(2), day(3), day(8)], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), Some(day(2)));
        assert_eq!(series.last_date(), Some(day(8)));
    }

    #[test]
    fn test_series_rejects_unordered_dates() {
        let result = PriceSeries::from_parts("PLUG", &[day(3), day(2)], &[1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));

        let result = PriceSeries::from_parts("PLUG", &[day(3), day(3)], &[1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn test_series_rejects_nan() {
        let result = PriceSeries::from_parts("PLUG", &[day(1), day(2)], &[1.0, f64::NAN]);
        assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn test_between_and_tail() {
        let dates: Vec<_> = (1..=10).map(day).collect();
        let closes: Vec<_> = (1..=10).map(|v| v as f64).collect();
        let series = PriceSeries::from_parts("NIO", &dates, &closes).unwrap();

        let window = series.between(day(3), day(5));
        assert_eq!(window.closes(), vec![3.0, 4.0, 5.0]);
        assert_eq!(window.symbol(), "NIO");

        assert_eq!(series.tail(2).closes(), vec![9.0, 10.0]);
        assert_eq!(series.tail(50).len(), 10);
    }
}
