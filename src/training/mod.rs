//! # Training
//!
//! Full-batch gradient descent (Adam, MSE) over a fixed number of epochs.

mod history;
mod trainer;

pub use history::TrainingHistory;
pub use trainer::Trainer;
