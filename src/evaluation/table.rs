//! Date-indexed prediction tables

use crate::error::Result;
use crate::utils::DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One predicted/actual pair in price units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub predicted: f64,
    pub actual: f64,
}

impl ForecastRow {
    pub fn error(&self) -> f64 {
        self.predicted - self.actual
    }
}

/// Predictions for one horizon step, indexed by the label date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    step: usize,
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn new(step: usize, rows: Vec<ForecastRow>) -> Self {
        Self { step, rows }
    }

    /// 1-based horizon step this table belongs to
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&ForecastRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Writes `date,predicted,actual` rows
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(["date", "predicted", "actual"])?;
        for row in &self.rows {
            writer.write_record([
                row.date.format(DATE_FORMAT).to_string(),
                row.predicted.to_string(),
                row.actual.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}
