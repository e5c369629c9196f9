//! Liquidation: debt resolution, collateral seizure and orchestration.

pub mod collateral;
pub mod debt;
pub mod engine;

pub use collateral::{split_collateral, transfer_collateral, CollateralDisposition, CollateralSplit};
pub use debt::{burn_debt, plan_debt_payoff, resolve_debt_amount, DebtPayoffPlan};
pub use engine::{liquidation_call, liquidation_dry_run, LiquidationOutcome, LiquidationParams};
