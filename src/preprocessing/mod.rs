//! # Data preparation
//!
//! Preparing a price series for the GRU:
//! - Min-max scaling
//! - Sliding windows (multi-step or single-step labels)
//! - Chronological train/test split
//!
//! ## Example
//!
//! ```rust,no_run
//! use price_gru::data::PriceSeries;
//! use price_gru::preprocessing::{chronological_split, LabelMode, ScaledSeries, Windower};
//!
//! # fn run(series: &PriceSeries) -> price_gru::Result<()> {
//! let scaled = ScaledSeries::fit(series, (-1.0, 1.0))?;
//!
//! // 20 days back, 7 days ahead
//! let windower = Windower::new(20, 7, LabelMode::AllSteps)?;
//! let dataset = windower.window(&scaled)?;
//!
//! // 80% / 20%, never shuffled
//! let (train, test) = chronological_split(&dataset, 0.2)?;
//! # Ok(())
//! # }
//! ```

mod dataset;
mod normalizer;
mod split;
mod windower;

pub use dataset::SequenceDataset;
pub use normalizer::{MinMaxScaler, ScaledSeries};
pub use split::{chronological_split, split_counts, validation_split};
pub use windower::{window_multi, window_single, LabelMode, Windower};
