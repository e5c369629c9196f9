//! Shared utilities: constants, identifiers and fixed-point math.

pub mod constants;
pub mod ids;
pub mod math;
