//! # Price data
//!
//! In-memory closing-price series. Fetching from a market-data provider is
//! left to the caller; `utils::io` can read a series back from CSV.

mod types;

pub use types::{PricePoint, PriceSeries};
