//! Chronological train/test split
//!
//! Samples are never shuffled: the windower emits them in increasing start
//! order, so a prefix/suffix cut keeps every training window before the test
//! period.

use super::dataset::SequenceDataset;
use crate::error::{ForecastError, Result};

/// `(train_count, test_count)` for `total` samples
///
/// `test_count = round(test_fraction * total)` with ties to even.
pub fn split_counts(total: usize, test_fraction: f64) -> Result<(usize, usize)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "test_fraction {} not in (0, 1)",
            test_fraction
        )));
    }

    let test_count = (test_fraction * total as f64).round_ties_even() as usize;
    Ok((total - test_count, test_count))
}

/// Splits into a training prefix and a testing suffix
pub fn chronological_split(
    dataset: &SequenceDataset,
    test_fraction: f64,
) -> Result<(SequenceDataset, SequenceDataset)> {
    let total = dataset.len();
    let (train_count, test_count) = split_counts(total, test_fraction)?;

    log::debug!(
        "Chronological split: {} train / {} test of {} samples",
        train_count,
        test_count,
        total
    );

    Ok((dataset.slice(0..train_count), dataset.slice(train_count..total)))
}

/// Carves a validation tail off the end of the training prefix
///
/// Returns the training set unchanged and no validation set when
/// `validation_fraction` is zero or leaves nothing to validate on.
pub fn validation_split(
    train: SequenceDataset,
    validation_fraction: f64,
) -> Result<(SequenceDataset, Option<SequenceDataset>)> {
    if validation_fraction == 0.0 {
        return Ok((train, None));
    }

    let (fit_count, val_count) = split_counts(train.len(), validation_fraction)?;
    if val_count == 0 || fit_count == 0 {
        log::warn!(
            "Validation fraction {} leaves {} fit / {} validation samples, validation disabled",
            validation_fraction,
            fit_count,
            val_count
        );
        return Ok((train, None));
    }

    let total = train.len();
    Ok((train.slice(0..fit_count), Some(train.slice(fit_count..total))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use ndarray::{Array2, Array3};

    fn dataset(n: usize) -> SequenceDataset {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..n)
            .map(|i| vec![start + Duration::days(i as i64), start + Duration::days(i as i64 + 1)])
            .collect();
        SequenceDataset::new(Array3::zeros((n, 5, 1)), Array2::zeros((n, 2)), dates).unwrap()
    }

    #[test]
    fn test_split_counts() {
        assert_eq!(split_counts(974, 0.2).unwrap(), (779, 195));
        assert_eq!(split_counts(90, 0.2).unwrap(), (72, 18));
        assert_eq!(split_counts(0, 0.2).unwrap(), (0, 0));
        assert_eq!(split_counts(2, 0.2).unwrap(), (2, 0));
        // 2.5 rounds to 2, 3.5 to 4
        assert_eq!(split_counts(5, 0.5).unwrap(), (3, 2));
        assert_eq!(split_counts(7, 0.5).unwrap(), (3, 4));
    }

    #[test]
    fn test_invalid_fraction() {
        assert!(split_counts(10, 0.0).is_err());
        assert!(split_counts(10, 1.0).is_err());
        assert!(split_counts(10, f64::NAN).is_err());
    }

    #[test]
    fn test_split_is_chronological() {
        let data = dataset(100);
        let (train, test) = chronological_split(&data, 0.2).unwrap();

        assert_eq!(train.len() + test.len(), 100);
        assert_eq!(test.len(), 20);
        // per horizon step, every training date precedes every test date
        let last_train = train.label_dates().last().unwrap();
        let first_test = &test.label_dates()[0];
        for step in 0..2 {
            assert!(last_train[step] < first_test[step]);
        }
        assert_eq!(train.label_dates()[0], data.label_dates()[0]);
        assert_eq!(test.label_dates()[0], data.label_dates()[80]);
    }

    #[test]
    fn test_validation_split() {
        let (train, _) = chronological_split(&dataset(100), 0.2).unwrap();

        let (fit, val) = validation_split(train.clone(), 0.25).unwrap();
        let val = val.unwrap();
        assert_eq!(fit.len(), 60);
        assert_eq!(val.len(), 20);
        assert_eq!(val.label_dates()[0], train.label_dates()[60]);

        let (same, none) = validation_split(train.clone(), 0.0).unwrap();
        assert_eq!(same.len(), 80);
        assert!(none.is_none());
    }
}
