//! Integration tests for the liquidation subsystem.
//!
//! These tests drive whole scenarios through the public pool API: deposits
//! and borrows build the positions, a price move makes the borrower
//! unhealthy, and `liquidation_call` resolves it. Both collateral
//! dispositions, the close-factor sentinel, fee splits, flag and NFT side
//! effects and the dry-run path are covered.

use mlend::boost::nft::NftTier;
use mlend::prelude::*;
use mlend::utils::constants::PRICE_PRECISION;
use mlend::utils::math::percent_mul;

// ═══════════════════════════════════════════════════════════════════════════════
// TEST HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

const UNIT: u128 = 1_000_000; // both test assets use 6 decimals
const DOLLAR: u128 = PRICE_PRECISION;

fn usdc() -> AssetId {
    AssetId::new("USDC")
}

fn meld() -> AssetId {
    AssetId::new("MELD")
}

fn alice() -> UserId {
    UserId::new("alice")
}

fn bob() -> UserId {
    UserId::new("bob")
}

fn dan() -> UserId {
    UserId::new("dan")
}

fn setup() -> (LendingPool, StaticPriceOracle, FlatInterestRateModel) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut pool = LendingPool::new(ProtocolConfig::default()).unwrap();
    pool.list_reserve(usdc(), ReserveConfig::default().with_decimals(6), 0)
        .unwrap();
    pool.list_reserve(
        meld(),
        ReserveConfig::default().with_decimals(6).with_yield_boost(),
        0,
    )
    .unwrap();

    let mut oracle = StaticPriceOracle::new();
    oracle.set_price(usdc(), DOLLAR);
    oracle.set_price(meld(), 40_000_000); // $0.40

    (pool, oracle, FlatInterestRateModel::zero())
}

/// Alice seeds 10,000 USDC of liquidity, bob posts 1,500 MELD at $0.40 and
/// borrows 400 USDC variable, then MELD halves to $0.20. Bob's health factor
/// lands at 0.6; dan holds 1,000 USDC to liquidate with.
fn crash_scenario() -> (LendingPool, StaticPriceOracle, FlatInterestRateModel) {
    let (mut pool, mut oracle, model) = setup();

    pool.fund_wallet(&alice(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &meld(), 1_500 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &usdc(), 1_000 * UNIT).unwrap();

    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.deposit(&meld(), &bob(), 1_500 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        400 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();

    oracle.set_price(meld(), 20_000_000); // $0.20
    (pool, oracle, model)
}

fn params(debt_to_cover: u128, receive_mtoken: bool) -> LiquidationParams {
    LiquidationParams {
        collateral_asset: meld(),
        debt_asset: usdc(),
        borrower: bob(),
        liquidator: dan(),
        debt_to_cover,
        receive_mtoken,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUND-TRIP SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mtoken_liquidation_round_trip() {
    let (mut pool, oracle, model) = crash_scenario();
    let liquidity_before = pool.reserve(&usdc()).unwrap().available_liquidity;
    assert_eq!(liquidity_before, 9_600 * UNIT);

    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0)
        .unwrap();

    // debt covered exactly as requested, and the reserve received it
    assert_eq!(outcome.debt_liquidated, 150 * UNIT);
    assert_eq!(
        pool.reserve(&usdc()).unwrap().available_liquidity,
        liquidity_before + 150 * UNIT
    );
    let bob_position = pool.ledger.position(&bob(), &usdc()).unwrap();
    assert_eq!(
        bob_position.variable_debt(pool.reserve(&usdc()).unwrap().variable_borrow_index).unwrap(),
        250 * UNIT
    );

    // seized collateral matches the sizing formula: 150 * 1.05 / 0.20 = 787.5 MELD
    let expected = mlend::health::calc_max_liquidatable_collateral(
        20_000_000,
        6,
        DOLLAR,
        6,
        10_500,
        150 * UNIT,
    )
    .unwrap();
    assert_eq!(outcome.collateral_liquidated, expected);
    assert_eq!(outcome.collateral_liquidated, 787_500_000);
    assert_eq!(outcome.disposition, CollateralDisposition::Retained);

    // mTokens moved in place: MELD liquidity untouched, dan's flag enabled
    assert_eq!(
        pool.reserve(&meld()).unwrap().available_liquidity,
        1_500 * UNIT
    );
    let dan_position = pool.ledger.position(&dan(), &meld()).unwrap();
    assert!(dan_position.usage_as_collateral);
    assert_eq!(dan_position.scaled_collateral, 708_750_000); // 90% of 787.5
    assert_eq!(outcome.events.filter_by_type("LiquidationCall").len(), 1);
}

#[test]
fn test_sentinel_liquidation_restores_health() {
    let (mut pool, mut oracle, model) = setup();
    oracle.set_price(meld(), 105_000_000); // $1.05

    pool.fund_wallet(&alice(), &meld(), 5_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &meld(), 2_000 * UNIT).unwrap();

    pool.deposit(&meld(), &alice(), 5_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.deposit(&usdc(), &bob(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &meld(),
        &bob(),
        2_000 * UNIT,
        InterestRateMode::Stable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();

    oracle.set_price(meld(), 420_000_000); // $4.20, debt value now exceeds borrowing power
    let hf_before = pool.account_data(&oracle, &bob(), 0).unwrap().health_factor;
    assert!(hf_before < RAY);

    let liquidation = LiquidationParams {
        collateral_asset: usdc(),
        debt_asset: meld(),
        borrower: bob(),
        liquidator: dan(),
        debt_to_cover: MAX_AMOUNT,
        receive_mtoken: false,
    };
    let outcome = liquidation_call(&mut pool, &oracle, &model, &liquidation, 0).unwrap();

    // the sentinel stops exactly at the close factor: half of 2,000 MELD
    assert_eq!(
        outcome.debt_liquidated,
        percent_mul(2_000 * UNIT, 5_000).unwrap()
    );
    assert_eq!(
        pool.ledger
            .position(&bob(), &meld())
            .unwrap()
            .principal_stable_debt,
        1_000 * UNIT
    );

    // released path: 1,000 MELD * $4.20 * 1.05 = 4,410 USDC left the pool
    assert_eq!(outcome.disposition, CollateralDisposition::Released);
    assert_eq!(outcome.collateral_liquidated, 4_410 * UNIT);
    assert_eq!(
        pool.reserve(&usdc()).unwrap().available_liquidity,
        (10_000 - 4_410) * UNIT
    );
    assert_eq!(
        pool.reserve(&meld()).unwrap().available_liquidity,
        (5_000 - 2_000 + 1_000) * UNIT
    );
    assert_eq!(
        pool.ledger.underlying_balance(&dan(), &usdc()),
        3_969 * UNIT
    );
    assert_eq!(
        pool.ledger
            .underlying_balance(&pool.config.treasury, &usdc()),
        441 * UNIT
    );

    // one call brings the account back above water
    let after = pool.account_data(&oracle, &bob(), 0).unwrap();
    assert!(after.health_factor >= RAY);
    assert!(after.health_factor > hf_before);
}

#[test]
fn test_zero_protocol_fee_pays_liquidator_everything() {
    let (mut pool, oracle, model) = crash_scenario();
    pool.reserve_mut(&meld())
        .unwrap()
        .config
        .liquidation_protocol_fee_bps = 0;

    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0)
        .unwrap();

    assert_eq!(outcome.protocol_fee, 0);
    assert_eq!(outcome.collateral_liquidated, 787_500_000);
    // every seized token reaches the liquidator, none parks with the treasury
    assert_eq!(
        pool.ledger.position(&dan(), &meld()).unwrap().scaled_collateral,
        787_500_000
    );
    assert!(pool
        .ledger
        .position(&pool.config.treasury, &meld())
        .map(|p| p.scaled_collateral == 0)
        .unwrap_or(true));
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEBT RESOLUTION PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_liquidation_within_variable_debt_leaves_stable_untouched() {
    let (mut pool, mut oracle, model) = setup();
    pool.fund_wallet(&alice(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &meld(), 1_500 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &usdc(), 1_000 * UNIT).unwrap();

    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.deposit(&meld(), &bob(), 1_500 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        200 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        100 * UNIT,
        InterestRateMode::Stable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();
    oracle.set_price(meld(), 20_000_000);

    let stable_before = pool
        .ledger
        .position(&bob(), &usdc())
        .unwrap()
        .principal_stable_debt;

    // covering 150 of 200 variable debt must never reach the stable leg
    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0)
        .unwrap();

    assert_eq!(outcome.debt_liquidated, 150 * UNIT);
    assert_eq!(outcome.events.filter_by_type("StableDebtBurned").len(), 0);
    assert_eq!(outcome.events.filter_by_type("VariableDebtBurned").len(), 1);
    let position = pool.ledger.position(&bob(), &usdc()).unwrap();
    assert_eq!(position.principal_stable_debt, stable_before);
    assert_eq!(
        position
            .variable_debt(pool.reserve(&usdc()).unwrap().variable_borrow_index)
            .unwrap(),
        50 * UNIT
    );
}

#[test]
fn test_sentinel_caps_mixed_debt_at_close_factor() {
    let (mut pool, mut oracle, model) = setup();
    pool.fund_wallet(&alice(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &meld(), 1_500 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &usdc(), 1_000 * UNIT).unwrap();

    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.deposit(&meld(), &bob(), 1_500 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        200 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        100 * UNIT,
        InterestRateMode::Stable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();
    oracle.set_price(meld(), 20_000_000);

    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(MAX_AMOUNT, true), 0)
        .unwrap();

    // half of the 300 total, all taken from the variable leg
    assert_eq!(outcome.debt_liquidated, 150 * UNIT);
    let position = pool.ledger.position(&bob(), &usdc()).unwrap();
    assert_eq!(position.principal_stable_debt, 100 * UNIT);
    assert_eq!(
        position
            .variable_debt(pool.reserve(&usdc()).unwrap().variable_borrow_index)
            .unwrap(),
        50 * UNIT
    );
}

#[test]
fn test_sequential_liquidations_shrink_debt_at_fixed_index() {
    let (mut pool, oracle, model) = crash_scenario();
    let index_before = pool.reserve(&usdc()).unwrap().variable_borrow_index;

    let first =
        liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0).unwrap();
    assert_eq!(first.debt_liquidated, 150 * UNIT);

    // a second call in the same second sees the reduced debt, so the close
    // factor yields half of the remaining 250, at an unchanged index
    let second =
        liquidation_call(&mut pool, &oracle, &model, &params(MAX_AMOUNT, true), 0).unwrap();
    assert_eq!(second.debt_liquidated, 125 * UNIT);
    assert_eq!(
        pool.reserve(&usdc()).unwrap().variable_borrow_index,
        index_before
    );
    assert_eq!(
        pool.ledger
            .position(&bob(), &usdc())
            .unwrap()
            .variable_debt(pool.reserve(&usdc()).unwrap().variable_borrow_index)
            .unwrap(),
        125 * UNIT
    );
}

#[test]
fn test_collateral_split_conserves_seizure() {
    let (mut pool, oracle, model) = crash_scenario();

    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0)
        .unwrap();

    let dan_scaled = pool.ledger.position(&dan(), &meld()).unwrap().scaled_collateral;
    let treasury_scaled = pool
        .ledger
        .position(&pool.config.treasury, &meld())
        .unwrap()
        .scaled_collateral;
    // indices sit at one ray here, so scaled balances equal native amounts
    assert_eq!(dan_scaled + treasury_scaled, outcome.collateral_liquidated);
    assert_eq!(treasury_scaled, outcome.protocol_fee);
    assert_eq!(outcome.protocol_fee, percent_mul(outcome.collateral_liquidated, 1_000).unwrap());
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLAG AND NFT SIDE EFFECTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_full_seizure_flips_both_collateral_flags() {
    let (mut pool, mut oracle, model) = setup();
    pool.fund_wallet(&alice(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &meld(), 100 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &usdc(), 1_000 * UNIT).unwrap();

    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.deposit(&meld(), &bob(), 100 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        30 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();

    oracle.set_price(meld(), 10_000_000); // $0.10, deep underwater
    assert!(!pool
        .ledger
        .position(&dan(), &meld())
        .map(|p| p.usage_as_collateral)
        .unwrap_or(false));

    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(MAX_AMOUNT, true), 0)
        .unwrap();

    // the entitlement exceeds bob's 100 MELD, so the whole balance is seized
    // and the debt covered is back-solved from it
    assert_eq!(outcome.collateral_liquidated, 100 * UNIT);
    assert!(outcome.debt_liquidated < 15 * UNIT);

    let bob_position = pool.ledger.position(&bob(), &meld()).unwrap();
    assert_eq!(bob_position.scaled_collateral, 0);
    assert!(!bob_position.usage_as_collateral);
    assert!(pool.ledger.position(&dan(), &meld()).unwrap().usage_as_collateral);
    assert_eq!(outcome.events.filter_by_type("CollateralUsageDisabled").len(), 1);
}

#[test]
fn test_nft_unlocks_when_bound_collateral_zeroes() {
    let (mut pool, mut oracle, model) = setup();
    pool.nft_registry.register_token(7, NftTier::Banker);
    pool.fund_wallet(&alice(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &meld(), 100 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &usdc(), 1_000 * UNIT).unwrap();

    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.deposit(&meld(), &bob(), 100 * UNIT, Some(7), &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        30 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();
    assert!(pool.nft_registry.binding(&bob()).is_some());

    oracle.set_price(meld(), 10_000_000);
    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(MAX_AMOUNT, true), 0)
        .unwrap();

    // full seizure zeroes the bound (MELD, Deposit) position
    assert_eq!(outcome.collateral_liquidated, 100 * UNIT);
    assert!(pool.nft_registry.binding(&bob()).is_none());
    assert_eq!(outcome.events.filter_by_type("NftUnlocked").len(), 1);
}

#[test]
fn test_nft_bound_to_other_asset_survives_liquidation() {
    let (mut pool, mut oracle, model) = setup();
    pool.nft_registry.register_token(8, NftTier::Golden);
    pool.fund_wallet(&alice(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &meld(), 100 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &usdc(), 50 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &usdc(), 1_000 * UNIT).unwrap();

    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    // the binding sits on the USDC deposit, not the MELD collateral
    pool.deposit(&usdc(), &bob(), 50 * UNIT, Some(8), &model, 0)
        .unwrap();
    pool.deposit(&meld(), &bob(), 100 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        65 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();

    oracle.set_price(meld(), 5_000_000); // $0.05
    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(MAX_AMOUNT, true), 0)
        .unwrap();

    // the MELD position zeroes, but the (USDC, Deposit) binding must not move
    assert_eq!(outcome.collateral_liquidated, 100 * UNIT);
    assert_eq!(
        pool.ledger.position(&bob(), &meld()).unwrap().scaled_collateral,
        0
    );
    assert!(pool.nft_registry.binding(&bob()).is_some());
    assert_eq!(outcome.events.filter_by_type("NftUnlocked").len(), 0);
}

#[test]
fn test_yield_boost_stakes_follow_the_seizure() {
    let (mut pool, oracle, model) = crash_scenario();
    assert_eq!(pool.boost.stake_amount(&bob(), &meld()), 1_500 * UNIT);

    let outcome = liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0)
        .unwrap();

    // bob keeps 712.5 MELD, dan's new mTokens open a stake
    assert_eq!(pool.boost.stake_amount(&bob(), &meld()), 712_500_000);
    assert_eq!(pool.boost.stake_amount(&dan(), &meld()), 708_750_000);
    assert!(outcome.events.filter_by_type("StakePositionCreated").len() >= 1);
    assert!(outcome.events.filter_by_type("StakeAmountRefreshed").len() >= 2);
}

// ═══════════════════════════════════════════════════════════════════════════════
// HEALTH FACTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_health_factor_improves_across_liquidation() {
    let (mut pool, mut oracle, model) = setup();
    pool.fund_wallet(&alice(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &meld(), 1_500 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &usdc(), 1_000 * UNIT).unwrap();

    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.deposit(&meld(), &bob(), 1_500 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        400 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();

    // a shallow dip: collateral value still exceeds debt plus bonus, so
    // shedding debt moves the ratio the right way
    oracle.set_price(meld(), 32_000_000); // $0.32
    let before = pool.account_data(&oracle, &bob(), 0).unwrap();
    assert!(before.health_factor < RAY);

    liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0).unwrap();

    let after = pool.account_data(&oracle, &bob(), 0).unwrap();
    assert!(after.health_factor > before.health_factor);
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTEREST ACCRUAL
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reserve_update_idempotent_within_same_second() {
    let (mut pool, oracle, _) = setup();
    let model = FlatInterestRateModel::annual(RAY * 2 / 100, RAY / 10, RAY * 12 / 100);

    pool.fund_wallet(&alice(), &usdc(), 20_000 * UNIT).unwrap();
    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &alice(),
        400 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();

    let year = 31_536_000;
    pool.deposit(&usdc(), &alice(), UNIT, None, &model, year).unwrap();
    let reserve = pool.reserve(&usdc()).unwrap();
    let (liquidity_index, variable_index) =
        (reserve.liquidity_index, reserve.variable_borrow_index);
    assert!(variable_index > RAY);

    // a second accrual at the same timestamp must not move the indices
    pool.deposit(&usdc(), &alice(), UNIT, None, &model, year).unwrap();
    let reserve = pool.reserve(&usdc()).unwrap();
    assert_eq!(reserve.liquidity_index, liquidity_index);
    assert_eq!(reserve.variable_borrow_index, variable_index);
}

#[test]
fn test_liquidation_accrues_interest_first() {
    let (mut pool, mut oracle, _) = setup();
    let model = FlatInterestRateModel::annual(RAY * 2 / 100, RAY / 10, RAY * 12 / 100);

    pool.fund_wallet(&alice(), &usdc(), 10_000 * UNIT).unwrap();
    pool.fund_wallet(&bob(), &meld(), 1_500 * UNIT).unwrap();
    pool.fund_wallet(&dan(), &usdc(), 1_000 * UNIT).unwrap();

    pool.deposit(&usdc(), &alice(), 10_000 * UNIT, None, &model, 0)
        .unwrap();
    pool.deposit(&meld(), &bob(), 1_500 * UNIT, None, &model, 0)
        .unwrap();
    pool.borrow(
        &usdc(),
        &bob(),
        400 * UNIT,
        InterestRateMode::Variable,
        None,
        &oracle,
        &model,
        0,
    )
    .unwrap();

    // a year of 10% variable interest, then a price dip
    let year = 31_536_000;
    oracle.set_price(meld(), 30_000_000); // $0.30

    let projected_index = pool
        .reserve(&usdc())
        .unwrap()
        .projected_variable_borrow_index(year)
        .unwrap();
    let total_debt = pool
        .ledger
        .position(&bob(), &usdc())
        .unwrap()
        .variable_debt(projected_index)
        .unwrap();
    assert!(total_debt > 400 * UNIT);

    let outcome =
        liquidation_call(&mut pool, &oracle, &model, &params(MAX_AMOUNT, true), year).unwrap();

    // the close factor applies to the accrued debt, not the principal
    assert_eq!(
        outcome.debt_liquidated,
        percent_mul(total_debt, 5_000).unwrap()
    );
    assert!(outcome.events.filter_by_type("MintedToTreasury").len() >= 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION AND ATOMICITY
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_validation_rejections_leave_pool_untouched() {
    let (mut pool, mut oracle, model) = crash_scenario();
    let snapshot = pool.to_bytes().unwrap();

    let err = liquidation_call(&mut pool, &oracle, &model, &params(0, true), 0).unwrap_err();
    assert!(matches!(err, Error::InvalidAmount));

    // debt asset bob never borrowed
    let mut p = params(150 * UNIT, true);
    p.debt_asset = meld();
    p.collateral_asset = meld();
    let err = liquidation_call(&mut pool, &oracle, &model, &p, 0).unwrap_err();
    assert!(matches!(err, Error::SpecifiedCurrencyNotBorrowedByUser(_)));

    // collateral asset bob never enabled
    let mut p = params(150 * UNIT, true);
    p.collateral_asset = usdc();
    let err = liquidation_call(&mut pool, &oracle, &model, &p, 0).unwrap_err();
    assert!(matches!(err, Error::CollateralCannotBeLiquidated(_)));

    // healthy borrower once the price recovers
    oracle.set_price(meld(), 40_000_000);
    let err =
        liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0).unwrap_err();
    assert!(matches!(err, Error::HealthFactorNotBelowThreshold { .. }));

    assert_eq!(pool.to_bytes().unwrap(), snapshot);
}

#[test]
fn test_dry_run_matches_committed_call() {
    let (mut pool, oracle, model) = crash_scenario();
    let snapshot = pool.to_bytes().unwrap();

    let preview =
        liquidation_dry_run(&pool, &oracle, &model, &params(150 * UNIT, true), 0).unwrap();
    assert_eq!(pool.to_bytes().unwrap(), snapshot);

    // running the preview twice is deterministic
    let preview2 =
        liquidation_dry_run(&pool, &oracle, &model, &params(150 * UNIT, true), 0).unwrap();
    assert_eq!(preview.debt_liquidated, preview2.debt_liquidated);
    assert_eq!(preview.collateral_liquidated, preview2.collateral_liquidated);

    let outcome =
        liquidation_call(&mut pool, &oracle, &model, &params(150 * UNIT, true), 0).unwrap();
    assert_eq!(outcome.debt_liquidated, preview.debt_liquidated);
    assert_eq!(outcome.collateral_liquidated, preview.collateral_liquidated);
    assert_eq!(outcome.protocol_fee, preview.protocol_fee);
    assert_eq!(outcome.disposition, preview.disposition);
    assert_eq!(outcome.events.len(), preview.events.len());
    assert_ne!(pool.to_bytes().unwrap(), snapshot);
}
