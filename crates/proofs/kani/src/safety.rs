//! Kani proofs for pro-rata cycle allocation

use kani::{any, assume};
use withdrawal_model::allocator::{allocate, split_position, Allocation, CycleSnapshot};

use crate::generators::{any_claims, any_funds, snapshot_for};
use crate::sanitizer::Sanitize;

/// A single claimant never receives more than the cycle holds
#[kani::proof]
fn allocation_within_snapshot() {
    let active: u16 = any();
    let funds: u16 = any();
    let leftover: u16 = any();
    let pending: u8 = any();
    let snapshot = CycleSnapshot {
        active_shares: active as u128,
        available_funds: funds as u128,
        leftover_shares: leftover as u128,
        pending_withdrawals: pending as u64,
    }
    .sanitize();
    let personal: u16 = any();
    let personal = personal as u128;
    assume(personal >= 1 && personal <= snapshot.active_shares);
    // A lone claimant holds the whole bucket
    assume(snapshot.pending_withdrawals > 1 || personal == snapshot.active_shares);

    if let Ok(alloc) = allocate(&snapshot, personal) {
        kani::assert(alloc.funds <= snapshot.available_funds, "funds exceed cycle");
        kani::assert(
            alloc.leftover_shares <= snapshot.leftover_shares,
            "leftover exceeds cycle",
        );
        kani::assert(alloc.leftover_shares <= personal, "leftover exceeds position");
    }
}

/// The last claimant collects everything still in the cycle
#[kani::proof]
fn sole_claimant_takes_all() {
    let shares: u16 = any();
    let funds = any_funds();
    let leftover: u16 = any();
    assume(shares > 0);
    assume(leftover <= shares);

    let snapshot = snapshot_for(&[shares as u128], funds, leftover as u128);
    let alloc = allocate(&snapshot, shares as u128).unwrap();

    kani::assert(alloc.funds == funds, "funds left behind");
    kani::assert(alloc.leftover_shares == leftover as u128, "leftover left behind");
}

/// Redeeming every claimant in order pays out exactly the settled amounts
#[kani::proof]
#[kani::unwind(5)]
fn sequential_redeems_drain_cycle() {
    let claims = any_claims();
    let funds = any_funds();
    let leftover: u16 = any();
    let mut snapshot = snapshot_for(&claims, funds, leftover as u128);
    let settled = snapshot;

    let mut paid = 0u128;
    let mut returned = 0u128;
    for personal in claims.iter().copied() {
        let alloc = allocate(&snapshot, personal).unwrap();
        kani::assert(alloc.funds <= snapshot.available_funds, "overdrawn funds");
        kani::assert(alloc.leftover_shares <= snapshot.leftover_shares, "overdrawn leftover");

        paid += alloc.funds;
        returned += alloc.leftover_shares;
        snapshot.available_funds -= alloc.funds;
        snapshot.leftover_shares -= alloc.leftover_shares;
        snapshot.active_shares -= personal;
        snapshot.pending_withdrawals -= 1;

        kani::assert(
            snapshot.leftover_shares <= snapshot.active_shares,
            "leftover outgrew queued shares",
        );
    }

    kani::assert(paid == settled.available_funds, "funds not fully distributed");
    kani::assert(returned == settled.leftover_shares, "leftover not fully distributed");
}

/// Split parts always add back to the locked position
#[kani::proof]
fn split_conserves_position() {
    let personal: u16 = any();
    let leftover: u16 = any();
    let reclaim: u16 = any();
    assume(leftover <= personal);

    let alloc = Allocation {
        funds: 0,
        leftover_shares: leftover as u128,
    };
    let split = split_position(personal as u128, &alloc, reclaim as u128).unwrap();

    kani::assert(
        split.redeemed_shares + split.reclaimed_shares + split.remaining_shares == personal as u128,
        "split does not conserve shares",
    );
    kani::assert(split.reclaimed_shares <= reclaim as u128, "reclaimed more than asked");
}
