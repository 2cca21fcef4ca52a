//! Regression metrics over one forecast step (one column of predictions)

use ndarray::ArrayView1;

/// Mean Squared Error
pub fn mse(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    let diff = &y_true - &y_pred;
    diff.mapv(|x| x * x).mean().unwrap_or(0.0)
}

/// Root Mean Squared Error
pub fn rmse(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    mse(y_true, y_pred).sqrt()
}

/// Mean Absolute Error
pub fn mae(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    let diff = &y_true - &y_pred;
    diff.mapv(f64::abs).mean().unwrap_or(0.0)
}

/// Mean Absolute Percentage Error, in percent
///
/// Points where the actual value is zero are skipped.
pub fn mape(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        if *t != 0.0 {
            sum += ((t - p) / t).abs();
            count += 1;
        }
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f64 * 100.0
    }
}

/// R² score (coefficient of determination)
pub fn r2_score(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    let mean = y_true.mean().unwrap_or(0.0);

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - (ss_res / ss_tot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_rmse() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![1.0, 2.0, 3.0, 6.0];
        // mse = 4 / 4
        assert!((mse(y_true.view(), y_pred.view()) - 1.0).abs() < 1e-12);
        assert!((rmse(y_true.view(), y_pred.view()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_prediction() {
        let y = array![10.0, 11.0, 12.5];
        assert_eq!(rmse(y.view(), y.view()), 0.0);
        assert_eq!(mae(y.view(), y.view()), 0.0);
        assert!((r2_score(y.view(), y.view()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mape_skips_zeros() {
        let y_true = array![0.0, 100.0];
        let y_pred = array![5.0, 110.0];
        assert!((mape(y_true.view(), y_pred.view()) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_column_views() {
        let y_true = Array2::from_shape_vec((3, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]).unwrap();
        let y_pred = Array2::from_shape_vec((3, 2), vec![1.0, 13.0, 2.0, 17.0, 3.0, 30.0]).unwrap();

        assert_eq!(rmse(y_true.column(0), y_pred.column(0)), 0.0);
        assert!((mae(y_true.column(1), y_pred.column(1)) - 2.0).abs() < 1e-12);
    }
}
