//! Per-epoch loss history

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Loss recorded after every epoch, in scaled units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    train_loss: Vec<f64>,
    validation_loss: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(epochs: usize) -> Self {
        Self {
            train_loss: Vec::with_capacity(epochs),
            validation_loss: Vec::new(),
        }
    }

    /// Appends one epoch
    pub fn push(&mut self, train_loss: f64, validation_loss: Option<f64>) {
        self.train_loss.push(train_loss);
        if let Some(v) = validation_loss {
            self.validation_loss.push(v);
        }
    }

    /// Training loss per epoch
    pub fn losses(&self) -> &[f64] {
        &self.train_loss
    }

    /// Validation loss per epoch, if a validation set was monitored
    pub fn validation_losses(&self) -> Option<&[f64]> {
        if self.validation_loss.is_empty() {
            None
        } else {
            Some(&self.validation_loss)
        }
    }

    pub fn len(&self) -> usize {
        self.train_loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train_loss.is_empty()
    }

    pub fn first_loss(&self) -> Option<f64> {
        self.train_loss.first().copied()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.train_loss.last().copied()
    }

    /// Relative improvement from first to last epoch, in percent
    pub fn improvement_pct(&self) -> Option<f64> {
        match (self.first_loss(), self.final_loss()) {
            (Some(first), Some(last)) if first > 0.0 => Some((first - last) / first * 100.0),
            _ => None,
        }
    }

    /// Epoch (0-based) with the lowest validation loss
    pub fn best_validation_epoch(&self) -> Option<usize> {
        self.validation_loss
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(epoch, _)| epoch)
    }

    /// Writes `epoch,train_loss[,validation_loss]` rows
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let has_validation = self.validation_loss.len() == self.train_loss.len() && !self.is_empty();

        if has_validation {
            writer.write_record(["epoch", "train_loss", "validation_loss"])?;
        } else {
            writer.write_record(["epoch", "train_loss"])?;
        }

        for (epoch, loss) in self.train_loss.iter().enumerate() {
            let mut record = vec![(epoch + 1).to_string(), loss.to_string()];
            if has_validation {
                record.push(self.validation_loss[epoch].to_string());
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_tracking() {
        let mut history = TrainingHistory::new();
        history.push(0.4, None);
        history.push(0.3, None);
        history.push(0.1, None);

        assert_eq!(history.len(), 3);
        assert_eq!(history.first_loss(), Some(0.4));
        assert_eq!(history.final_loss(), Some(0.1));
        assert!((history.improvement_pct().unwrap() - 75.0).abs() < 1e-9);
        assert!(history.validation_losses().is_none());
    }

    #[test]
    fn test_best_validation_epoch() {
        let mut history = TrainingHistory::new();
        history.push(0.5, Some(0.6));
        history.push(0.4, Some(0.3));
        history.push(0.3, Some(0.35));

        assert_eq!(history.best_validation_epoch(), Some(1));
        assert_eq!(history.validation_losses().unwrap().len(), 3);
    }

    #[test]
    fn test_save_csv() {
        let mut history = TrainingHistory::new();
        history.push(0.5, Some(0.6));
        history.push(0.25, Some(0.3));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        history.save_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,validation_loss");
        assert_eq!(lines[2], "2,0.25,0.3");
    }
}
