//! # Evaluation
//!
//! Converts model outputs back to prices and scores every horizon step
//! separately, keeping each prediction aligned with the date it targets.

mod evaluator;
mod table;

pub use evaluator::{Evaluation, Evaluator, StepMetrics};
pub use table::{ForecastRow, ForecastTable};
