//! Windowed samples ready for the model

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use ndarray::{s, Array2, Array3};
use std::ops::Range;

/// Features, labels and label dates of a set of windows
///
/// * `features`: `[samples, lookback, 1]`
/// * `labels`: `[samples, output_dim]`
/// * `label_dates`: one `Vec` of `output_dim` dates per sample
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDataset {
    features: Array3<f64>,
    labels: Array2<f64>,
    label_dates: Vec<Vec<NaiveDate>>,
}

impl SequenceDataset {
    /// Assembles a dataset, checking that all three parts agree
    pub fn new(
        features: Array3<f64>,
        labels: Array2<f64>,
        label_dates: Vec<Vec<NaiveDate>>,
    ) -> Result<Self> {
        let (n, _, width) = features.dim();
        let (label_rows, output_dim) = labels.dim();

        if width != 1 {
            return Err(ForecastError::shape(
                "SequenceDataset features",
                "[n, lookback, 1]",
                format!("{:?}", features.shape()),
            ));
        }
        if label_rows != n {
            return Err(ForecastError::shape(
                "SequenceDataset labels",
                format!("{} rows", n),
                format!("{} rows", label_rows),
            ));
        }
        if label_dates.len() != n {
            return Err(ForecastError::shape(
                "SequenceDataset label dates",
                format!("{} rows", n),
                format!("{} rows", label_dates.len()),
            ));
        }
        if let Some(row) = label_dates.iter().find(|row| row.len() != output_dim) {
            return Err(ForecastError::shape(
                "SequenceDataset label dates",
                format!("{} dates per sample", output_dim),
                format!("{} dates", row.len()),
            ));
        }

        Ok(Self {
            features,
            labels,
            label_dates,
        })
    }

    /// A dataset with zero samples but the right trailing dimensions
    pub fn empty(lookback: usize, output_dim: usize) -> Self {
        Self {
            features: Array3::zeros((0, lookback, 1)),
            labels: Array2::zeros((0, output_dim)),
            label_dates: Vec::new(),
        }
    }

    pub fn features(&self) -> &Array3<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array2<f64> {
        &self.labels
    }

    pub fn label_dates(&self) -> &[Vec<NaiveDate>] {
        &self.label_dates
    }

    pub fn len(&self) -> usize {
        self.features.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookback(&self) -> usize {
        self.features.shape()[1]
    }

    pub fn output_dim(&self) -> usize {
        self.labels.shape()[1]
    }

    /// Contiguous sub-range of samples, order preserved
    pub fn slice(&self, range: Range<usize>) -> SequenceDataset {
        SequenceDataset {
            features: self.features.slice(s![range.clone(), .., ..]).to_owned(),
            labels: self.labels.slice(s![range.clone(), ..]).to_owned(),
            label_dates: self.label_dates[range].to_vec(),
        }
    }

    /// Earliest label date of any sample
    pub fn min_label_date(&self) -> Option<NaiveDate> {
        self.label_dates.iter().flatten().min().copied()
    }

    /// Latest label date of any sample
    pub fn max_label_date(&self) -> Option<NaiveDate> {
        self.label_dates.iter().flatten().max().copied()
    }
}
