//! Fixed-point arithmetic for monetary calculations.
//!
//! All monetary math runs on `u128` with explicit overflow checks. Indices,
//! rates and health factors are ray-scaled (10^27); configuration percentages
//! are basis points (10^4). Ray and percentage operations round half-up.
//!
//! Headroom constraint: ray operations widen by 10^27, so native amounts must
//! stay below `u128::MAX / RAY` (~3.4 * 10^11 base units). Larger amounts
//! surface as `Error::Overflow` rather than wrapping.

use crate::error::{Error, Result};
use crate::utils::constants::{HALF_PERCENT, HALF_RAY, PERCENT_FACTOR, RAY};

// ═══════════════════════════════════════════════════════════════════════════════
// SAFE ARITHMETIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(Error::Overflow {
        operation: format!("{} + {}", a, b),
    })
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(Error::Underflow {
        operation: format!("{} - {}", a, b),
    })
}

/// Safe multiplication with overflow check
pub fn safe_mul(a: u128, b: u128) -> Result<u128> {
    a.checked_mul(b).ok_or(Error::Overflow {
        operation: format!("{} * {}", a, b),
    })
}

/// Safe division with zero check
pub fn safe_div(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(Error::DivisionByZero {
            operation: format!("{} / 0", a),
        });
    }
    Ok(a / b)
}

/// Safe multiply-then-divide: (a * b) / c, truncating
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(Error::DivisionByZero {
            operation: format!("({} * {}) / 0", a, b),
        });
    }
    safe_div(safe_mul(a, b)?, c)
}

// ═══════════════════════════════════════════════════════════════════════════════
// RAY OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Multiply two ray-scaled values (or a native amount by a ray index),
/// rounding half-up
pub fn ray_mul(a: u128, b: u128) -> Result<u128> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    let product = safe_mul(a, b)?;
    safe_div(safe_add(product, HALF_RAY)?, RAY)
}

/// Divide two ray-scaled values (or a native amount by a ray index),
/// rounding half-up
pub fn ray_div(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(Error::DivisionByZero {
            operation: format!("ray_div({}, 0)", a),
        });
    }
    let scaled = safe_mul(a, RAY)?;
    safe_div(safe_add(scaled, b / 2)?, b)
}

/// Ray-scaled ratio `a / b` for operands that may exceed the ray headroom.
/// When `a * RAY` would overflow, equal binary precision is shed from both
/// sides before dividing. Used for health factors, where operands are summed
/// portfolio values.
pub fn ray_ratio(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(Error::DivisionByZero {
            operation: format!("ray_ratio({}, 0)", a),
        });
    }
    let mut a = a;
    let mut b = b;
    while a > u128::MAX / RAY {
        a >>= 1;
        b = (b >> 1).max(1);
    }
    ray_div(a, b)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PERCENTAGE OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Multiply an amount by a basis-point percentage, rounding half-up
pub fn percent_mul(amount: u128, bps: u64) -> Result<u128> {
    if amount == 0 || bps == 0 {
        return Ok(0);
    }
    let product = safe_mul(amount, bps as u128)?;
    safe_div(safe_add(product, HALF_PERCENT)?, PERCENT_FACTOR)
}

/// Divide an amount by a basis-point percentage, rounding half-up
pub fn percent_div(amount: u128, bps: u64) -> Result<u128> {
    if bps == 0 {
        return Err(Error::DivisionByZero {
            operation: format!("percent_div({}, 0)", amount),
        });
    }
    let scaled = safe_mul(amount, PERCENT_FACTOR)?;
    safe_div(safe_add(scaled, (bps as u128) / 2)?, bps as u128)
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTEREST ACCRUAL
// ═══════════════════════════════════════════════════════════════════════════════

/// Linear interest factor over `elapsed` seconds at a per-second ray rate:
/// `1 + rate * elapsed` (ray)
pub fn linear_interest(rate_per_second: u128, elapsed: u64) -> Result<u128> {
    safe_add(RAY, safe_mul(rate_per_second, elapsed as u128)?)
}

/// Compounded interest factor over `elapsed` seconds at a per-second ray
/// rate, using the three-term binomial expansion
/// `1 + n*r + n(n-1)/2 * r^2 + n(n-1)(n-2)/6 * r^3` (ray).
/// The expansion undershoots exact compounding for long periods.
pub fn compounded_interest(rate_per_second: u128, elapsed: u64) -> Result<u128> {
    if elapsed == 0 {
        return Ok(RAY);
    }
    let n = elapsed as u128;
    let n_minus_1 = n.saturating_sub(1);
    let n_minus_2 = n.saturating_sub(2);

    let rate_pow2 = ray_mul(rate_per_second, rate_per_second)?;
    let rate_pow3 = ray_mul(rate_pow2, rate_per_second)?;

    let first = safe_mul(rate_per_second, n)?;
    let second = safe_div(safe_mul(safe_mul(n, n_minus_1)?, rate_pow2)?, 2)?;
    let third = safe_div(safe_mul(safe_mul(safe_mul(n, n_minus_1)?, n_minus_2)?, rate_pow3)?, 6)?;

    safe_add(RAY, safe_add(first, safe_add(second, third)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::SECONDS_PER_YEAR;
    use proptest::prelude::*;

    #[test]
    fn test_safe_arithmetic() {
        assert!(safe_add(1, 2).is_ok());
        assert!(safe_add(u128::MAX, 1).is_err());

        assert!(safe_sub(5, 3).is_ok());
        assert!(safe_sub(3, 5).is_err());

        assert!(safe_mul(100, 200).is_ok());
        assert!(safe_mul(u128::MAX, 2).is_err());

        assert!(safe_div(100, 10).is_ok());
        assert!(safe_div(100, 0).is_err());
    }

    #[test]
    fn test_ray_identity() {
        assert_eq!(ray_mul(12_345, RAY).unwrap(), 12_345);
        assert_eq!(ray_div(12_345, RAY).unwrap(), 12_345);
    }

    #[test]
    fn test_ray_rounding_half_up() {
        // 1 * 0.5 ray rounds 0.5 up to 1
        assert_eq!(ray_mul(1, HALF_RAY).unwrap(), 1);
        // 1 * (0.5 - epsilon) rounds down to 0
        assert_eq!(ray_mul(1, HALF_RAY - 1).unwrap(), 0);
    }

    #[test]
    fn test_ray_ratio_matches_ray_div_in_range() {
        assert_eq!(ray_ratio(3, 2).unwrap(), ray_div(3, 2).unwrap());
        assert_eq!(ray_ratio(0, 5).unwrap(), 0);
        assert!(ray_ratio(1, 0).is_err());
    }

    #[test]
    fn test_ray_ratio_survives_large_operands() {
        // operands beyond the exact ray headroom still produce a close ratio
        let a = u128::MAX / 4;
        let b = u128::MAX / 8;
        let ratio = ray_ratio(a, b).unwrap();
        let diff = ratio.abs_diff(2 * RAY);
        assert!(diff < RAY / 1_000_000);
    }

    #[test]
    fn test_percent_operations() {
        // 50% of 400
        assert_eq!(percent_mul(400, 5_000).unwrap(), 200);
        // 105% of 1000
        assert_eq!(percent_mul(1_000, 10_500).unwrap(), 1_050);
        // inverse
        assert_eq!(percent_div(1_050, 10_500).unwrap(), 1_000);
        assert!(percent_div(100, 0).is_err());
    }

    #[test]
    fn test_linear_interest_zero_elapsed() {
        let rate = RAY / SECONDS_PER_YEAR; // 100% annual
        assert_eq!(linear_interest(rate, 0).unwrap(), RAY);
    }

    #[test]
    fn test_linear_interest_one_year() {
        // 10% annual, one year: factor = 1.1 ray
        let rate = RAY / 10 / SECONDS_PER_YEAR;
        let factor = linear_interest(rate, SECONDS_PER_YEAR as u64).unwrap();
        let expected = RAY + RAY / 10;
        // Truncation in the per-second rate loses at most SECONDS_PER_YEAR units
        assert!(expected - factor < SECONDS_PER_YEAR);
    }

    #[test]
    fn test_compounded_interest_zero_elapsed() {
        let rate = RAY / 10 / SECONDS_PER_YEAR;
        assert_eq!(compounded_interest(rate, 0).unwrap(), RAY);
    }

    #[test]
    fn test_compounded_exceeds_linear() {
        // Over a year at 20% annual, compounding beats linear accrual
        let rate = RAY / 5 / SECONDS_PER_YEAR;
        let linear = linear_interest(rate, SECONDS_PER_YEAR as u64).unwrap();
        let compounded = compounded_interest(rate, SECONDS_PER_YEAR as u64).unwrap();
        assert!(compounded > linear);
    }

    proptest! {
        #[test]
        fn prop_ray_mul_div_inverse(amount in 0u128..100_000_000_000u128,
                                    index in RAY..(RAY * 3)) {
            // ray_div then ray_mul round-trips within one unit of rounding
            let scaled = ray_div(amount, index).unwrap();
            let back = ray_mul(scaled, index).unwrap();
            let diff = back.abs_diff(amount);
            prop_assert!(diff <= 1 + index / RAY);
        }

        #[test]
        fn prop_percent_mul_monotonic(amount in 0u128..1_000_000_000_000_000u128,
                                      bps in 0u64..10_000u64) {
            // a percentage below 100% never grows the amount
            let part = percent_mul(amount, bps).unwrap();
            prop_assert!(part <= amount);
        }

        #[test]
        fn prop_compounded_at_least_ray(rate in 0u128..(RAY / 1_000_000),
                                        elapsed in 0u64..(10 * 31_536_000u64)) {
            // interest factors never shrink a balance
            let factor = compounded_interest(rate, elapsed).unwrap();
            prop_assert!(factor >= RAY);
        }
    }
}
