//! Generators for arbitrary cycle state (for Kani)

#[cfg(kani)]
use kani::any;
use arrayvec::ArrayVec;
use withdrawal_model::allocator::CycleSnapshot;

use crate::sanitizer::MAX_CLAIMANTS;
#[cfg(kani)]
use crate::sanitizer::{MAX_FUNDS, MAX_SHARES};

/// Settled cycle whose shares are split among `claims`
pub fn snapshot_for(claims: &[u128], funds: u128, leftover: u128) -> CycleSnapshot {
    let active_shares = claims.iter().fold(0u128, |acc, c| acc.saturating_add(*c));
    CycleSnapshot {
        active_shares,
        available_funds: funds,
        leftover_shares: leftover.min(active_shares),
        pending_withdrawals: claims.len() as u64,
    }
}

#[cfg(kani)]
pub fn any_claims() -> ArrayVec<u128, MAX_CLAIMANTS> {
    let count: u8 = any();
    let count = (count as usize % MAX_CLAIMANTS) + 1;

    let mut claims = ArrayVec::new();
    for _ in 0..count {
        let raw: u16 = any();
        claims.push(((raw as u128) % MAX_SHARES).max(1));
    }
    claims
}

#[cfg(kani)]
pub fn any_funds() -> u128 {
    let raw: u16 = any();
    (raw as u128) % MAX_FUNDS
}

/// Fixed claimant set for unit tests and concrete harnesses
pub fn claims_of(values: &[u128]) -> ArrayVec<u128, MAX_CLAIMANTS> {
    values.iter().copied().take(MAX_CLAIMANTS).collect()
}
