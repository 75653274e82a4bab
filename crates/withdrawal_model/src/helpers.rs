//! Invariant checking helpers

use std::collections::BTreeMap;

use crate::state::WithdrawalLedger;

/// Sum of locked shares and count of requests per target cycle
pub fn requests_by_cycle(ledger: &WithdrawalLedger) -> BTreeMap<u64, (u128, u64)> {
    let mut buckets: BTreeMap<u64, (u128, u64)> = BTreeMap::new();
    for (_, request) in ledger.requests() {
        let entry = buckets.entry(request.target_cycle).or_default();
        entry.0 = entry.0.saturating_add(request.locked_shares);
        entry.1 = entry.1.saturating_add(1);
    }
    buckets
}

/// Every bucket's `total_shares` and `pending_withdrawals` match the requests
/// targeting it.
///
/// Holds for processed cycles too: redeem removes each claimant's shares from
/// its bucket as it leaves.
pub fn buckets_consistent(ledger: &WithdrawalLedger) -> bool {
    let expected = requests_by_cycle(ledger);

    let cycles_ok = ledger.cycles().all(|(cycle, state)| {
        let (shares, count) = expected.get(&cycle).copied().unwrap_or((0, 0));
        state.total_shares == shares && state.pending_withdrawals == count
    });
    let requests_ok = expected.iter().all(|(cycle, (shares, count))| {
        let state = ledger.cycle(*cycle);
        state.total_shares == *shares && state.pending_withdrawals == *count
    });

    cycles_ok && requests_ok
}

/// Live requests never hold zero shares
pub fn no_empty_requests(ledger: &WithdrawalLedger) -> bool {
    ledger.requests().all(|(_, request)| request.locked_shares > 0)
}

/// Unallocated leftover never exceeds the shares still queued in a cycle,
/// and unprocessed cycles hold neither funds nor leftover.
pub fn settlement_bounded(ledger: &WithdrawalLedger) -> bool {
    ledger.cycles().all(|(_, state)| {
        if state.is_processed {
            state.leftover_shares <= state.total_shares
        } else {
            state.available_funds == 0 && state.leftover_shares == 0
        }
    })
}

/// Shares the manager's custody account should hold: everything queued in
/// unprocessed cycles plus unallocated leftover of processed ones.
pub fn expected_custody_shares(ledger: &WithdrawalLedger) -> u128 {
    ledger.cycles().fold(0u128, |acc, (_, state)| {
        let held = if state.is_processed {
            state.leftover_shares
        } else {
            state.total_shares
        };
        acc.saturating_add(held)
    })
}

/// Funds the manager's custody account should hold
pub fn expected_custody_funds(ledger: &WithdrawalLedger) -> u128 {
    ledger
        .cycles()
        .fold(0u128, |acc, (_, state)| acc.saturating_add(state.available_funds))
}
