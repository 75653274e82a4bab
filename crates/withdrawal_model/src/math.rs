//! Checked arithmetic helpers - no unwrap, no panics, no silent wraparound
//!
//! Ledger amounts must stay exact, so unlike saturating helpers these report
//! overflow and underflow as `WithdrawalError::Overflow`.

use alloy_primitives::U256;

use crate::error::{Result, WithdrawalError};

/// Add u128, failing on overflow
pub fn add_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(WithdrawalError::Overflow)
}

/// Subtract u128, failing on underflow
pub fn sub_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(WithdrawalError::Overflow)
}

/// Add u64, failing on overflow
pub fn add_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(WithdrawalError::Overflow)
}

/// Subtract u64, failing on underflow
pub fn sub_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(WithdrawalError::Overflow)
}

/// Multiply u64, failing on overflow
pub fn mul_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_mul(b).ok_or(WithdrawalError::Overflow)
}

/// floor(a * b / denom). A zero denominator yields 0.
///
/// The product is taken in 256 bits, so only a quotient that does not fit
/// back into u128 overflows.
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> Result<u128> {
    if denom == 0 {
        return Ok(0);
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(denom);
    u128::try_from(quotient).map_err(|_| WithdrawalError::Overflow)
}

/// Minimum of two u128
pub fn min_u128(a: u128, b: u128) -> u128 {
    if a < b { a } else { b }
}
