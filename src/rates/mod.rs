//! Interest-rate models consumed by reserve rate updates.

pub mod model;

pub use model::{ComputedRates, DefaultInterestRateModel, FlatInterestRateModel, InterestRateModel, RateInput};
