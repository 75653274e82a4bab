//! Pro-rata allocation of a settled cycle
//!
//! Claimants of a cycle share its settled funds and its leftover shares in
//! proportion to their locked shares. Division truncates, and the residue
//! ("dust") stays in the cycle until the last claimant takes everything left.

use crate::error::Result;
use crate::math::{min_u128, mul_div_floor, sub_u128};
use crate::state::CycleState;

/// Cycle aggregates as seen by one claimant, before its own redeem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSnapshot {
    pub active_shares: u128,
    pub available_funds: u128,
    pub leftover_shares: u128,
    pub pending_withdrawals: u64,
}

impl From<&CycleState> for CycleSnapshot {
    fn from(state: &CycleState) -> Self {
        Self {
            active_shares: state.total_shares,
            available_funds: state.available_funds,
            leftover_shares: state.leftover_shares,
            pending_withdrawals: state.pending_withdrawals,
        }
    }
}

/// One claimant's entitlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Allocation {
    pub funds: u128,
    pub leftover_shares: u128,
}

/// How a claimant's locked shares divide after allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionSplit {
    /// Shares that settlement converted into the claimant's funds
    pub redeemed_shares: u128,
    /// Leftover shares handed back now
    pub reclaimed_shares: u128,
    /// Leftover shares that stay queued for a later cycle
    pub remaining_shares: u128,
}

/// Entitlement of a claimant holding `personal_shares` of the cycle
pub fn allocate(snapshot: &CycleSnapshot, personal_shares: u128) -> Result<Allocation> {
    if snapshot.pending_withdrawals > 1 {
        Ok(Allocation {
            funds: mul_div_floor(snapshot.available_funds, personal_shares, snapshot.active_shares)?,
            leftover_shares: mul_div_floor(
                snapshot.leftover_shares,
                personal_shares,
                snapshot.active_shares,
            )?,
        })
    } else {
        // Sole remaining claimant collects the dust
        Ok(Allocation {
            funds: snapshot.available_funds,
            leftover_shares: snapshot.leftover_shares,
        })
    }
}

/// Split `personal_shares` given the allocation and how many leftover shares
/// the caller wants back.
pub fn split_position(
    personal_shares: u128,
    allocation: &Allocation,
    shares_to_reclaim: u128,
) -> Result<PositionSplit> {
    let redeemed_shares = sub_u128(personal_shares, allocation.leftover_shares)?;
    let reclaimed_shares = min_u128(shares_to_reclaim, allocation.leftover_shares);
    let remaining_shares = sub_u128(allocation.leftover_shares, reclaimed_shares)?;

    Ok(PositionSplit {
        redeemed_shares,
        reclaimed_shares,
        remaining_shares,
    })
}
