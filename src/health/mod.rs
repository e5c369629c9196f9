//! Health-factor aggregation and liquidation sizing.

pub mod account;

pub use account::{
    calc_debt_needed_for_collateral, calc_max_liquidatable_collateral, compute_account_data,
    AccountData,
};
