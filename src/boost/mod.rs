//! Yield-boost staking and banker NFT bindings.

pub mod nft;
pub mod stake;

pub use nft::{BoostMultiplierTable, NftAction, NftBinding, NftBindingRegistry, NftTier};
pub use stake::{StakePosition, YieldBoostLedger};
