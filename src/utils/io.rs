//! CSV persistence for price series

use crate::data::{PricePoint, PriceSeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use log::{debug, warn};
use std::path::Path;

/// Date format used in every CSV this crate reads or writes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column names used by [`load_series_csv`] when the caller does not care
pub const DEFAULT_DATE_COLUMN: &str = "Date";
pub const DEFAULT_CLOSE_COLUMN: &str = "Close";

/// Parses a `YYYY-MM-DD` date, ignoring any time-of-day suffix
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    Ok(NaiveDate::parse_from_str(day, DATE_FORMAT)?)
}

/// Loads a daily close series from a CSV file with a header row
///
/// Rows are sorted by date. Rows whose close is empty or not a number (such as
/// `null` in exported quote files) are skipped with a warning.
pub fn load_series_csv<P: AsRef<Path>>(
    path: P,
    symbol: &str,
    date_column: &str,
    close_column: &str,
) -> Result<PriceSeries> {
    let mut reader = Reader::from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| ForecastError::InvalidSeries(format!("column '{}' not found", name)))
    };
    let date_idx = find(date_column)?;
    let close_idx = find(close_column)?;

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result?;
        let (Some(raw_date), Some(raw_close)) = (record.get(date_idx), record.get(close_idx)) else {
            skipped += 1;
            continue;
        };

        let date = parse_date(raw_date)?;
        match raw_close.trim().parse::<f64>() {
            Ok(close) if close.is_finite() => points.push(PricePoint::new(date, close)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a usable close in {}", skipped, path.as_ref().display());
    }

    points.sort_by_key(|p| p.date);
    debug!("Loaded {} closes for {} from {}", points.len(), symbol, path.as_ref().display());

    PriceSeries::new(symbol, points)
}

/// Writes a series as `Date,Close` rows
pub fn save_series_csv<P: AsRef<Path>>(series: &PriceSeries, path: P) -> Result<()> {
    let mut writer = Writer::from_path(path)?;

    writer.write_record([DEFAULT_DATE_COLUMN, DEFAULT_CLOSE_COLUMN])?;
    for point in series.points() {
        writer.write_record([point.date.format(DATE_FORMAT).to_string(), point.close.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}
