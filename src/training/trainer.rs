//! Full-batch training loop

use super::history::TrainingHistory;
use crate::error::{ForecastError, Result};
use crate::model::{Adam, GRU};
use crate::preprocessing::SequenceDataset;
use crate::utils::config::TrainingConfig;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

/// Trains a GRU on the whole training set at once, for a fixed number of epochs
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Runs `num_epochs` epochs of forward / MSE / backward / Adam
    ///
    /// The loss of each epoch is measured before that epoch's update. When a
    /// validation set is given its loss is recorded after the update; it is
    /// only monitored and never stops training.
    pub fn fit(
        &self,
        model: &mut GRU,
        train: &SequenceDataset,
        validation: Option<&SequenceDataset>,
    ) -> Result<TrainingHistory> {
        if train.is_empty() {
            return Err(ForecastError::EmptyTrainingSet);
        }
        check_labels(model, train, "training labels")?;
        if let Some(val) = validation {
            check_labels(model, val, "validation labels")?;
        }

        let epochs = self.config.num_epochs;
        let x = train.features();
        let y = train.labels();
        let mut optimizer = Adam::new(self.config.learning_rate);
        let mut history = TrainingHistory::with_capacity(epochs);

        info!(
            "Training GRU ({} layers, {} hidden, {} outputs) on {} samples for {} epochs, lr {}",
            model.num_layers(),
            model.config.hidden_size,
            model.output_size(),
            train.len(),
            epochs,
            self.config.learning_rate
        );

        let pb = self.progress_bar(epochs);
        let mut warned_non_finite = false;

        for epoch in 0..epochs {
            let (predictions, cache) = model.forward_train(x)?;
            let loss = model.compute_loss(&predictions, y);

            if !loss.is_finite() && !warned_non_finite {
                warn!("Loss became {} at epoch {}", loss, epoch + 1);
                warned_non_finite = true;
            }

            let mut grads = model.backward(&cache, &model.loss_gradient(&predictions, y));
            if let Some(max_norm) = self.config.gradient_clip {
                let norm = grads.clip(max_norm);
                if norm > max_norm {
                    debug!("Clipped gradient norm {:.4} to {}", norm, max_norm);
                }
            }
            model.apply_gradients(&grads, &mut optimizer);

            let val_loss = match validation {
                Some(val) => {
                    let pred = model.forward(val.features())?;
                    Some(model.compute_loss(&pred, val.labels()))
                }
                None => None,
            };
            history.push(loss, val_loss);

            match val_loss {
                Some(v) => debug!("Epoch {} MSE: {:.6} (validation {:.6})", epoch + 1, loss, v),
                None => debug!("Epoch {} MSE: {:.6}", epoch + 1, loss),
            }
            if self.config.log_every > 0 && (epoch + 1) % self.config.log_every == 0 {
                info!("Epoch {}/{}: loss = {:.6}", epoch + 1, epochs, loss);
            }

            pb.set_message(format!("{:.6}", loss));
            pb.inc(1);
        }

        pb.finish_with_message(format!("{:.6}", history.final_loss().unwrap_or(f64::NAN)));

        if let Some(pct) = history.improvement_pct() {
            info!(
                "Training finished: loss {:.6} -> {:.6} ({:.2}% lower)",
                history.first_loss().unwrap_or(f64::NAN),
                history.final_loss().unwrap_or(f64::NAN),
                pct
            );
        }
        if let Some(best) = history.best_validation_epoch() {
            info!("Lowest validation loss at epoch {}", best + 1);
        }

        Ok(history)
    }

    fn progress_bar(&self, epochs: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(epochs as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) Loss: {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

fn check_labels(model: &GRU, dataset: &SequenceDataset, context: &'static str) -> Result<()> {
    if dataset.output_dim() != model.output_size() {
        return Err(ForecastError::shape(
            context,
            format!("[n, {}]", model.output_size()),
            format!("{:?}", dataset.labels().shape()),
        ));
    }
    Ok(())
}
