//! Request and cycle ledgers
//!
//! The manager owns one `WithdrawalLedger`: a per-account request table and a
//! per-cycle aggregate table. Every mutation goes through a `Journal` so a
//! failed call can put back exactly the entries it touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WithdrawalError};
use crate::math::{add_u128, sub_u128};
use crate::types::AccountId;

/// An account's queued withdrawal. Live requests always hold shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Request {
    pub locked_shares: u128,
    pub target_cycle: u64,
}

/// Aggregate state of one cycle's bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CycleState {
    /// Shares queued in the cycle. Frozen against lock/unlock once processed;
    /// redeem removes each claimant's shares as it leaves.
    pub total_shares: u128,
    /// Accounts still holding a claim on the cycle
    pub pending_withdrawals: u64,
    /// Funds claimed at settlement and not yet paid out
    pub available_funds: u128,
    /// Shares settlement could not convert and not yet allocated
    pub leftover_shares: u128,
    pub is_processed: bool,
}

/// Pre-images of every entry touched during one call
#[derive(Debug, Default)]
pub struct Journal {
    requests: BTreeMap<AccountId, Option<Request>>,
    cycles: BTreeMap<u64, Option<CycleState>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalLedger {
    requests: BTreeMap<AccountId, Request>,
    cycles: BTreeMap<u64, CycleState>,
}

impl WithdrawalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, account: &AccountId) -> Option<&Request> {
        self.requests.get(account)
    }

    /// Cycle state, defaulted if the cycle was never referenced
    pub fn cycle(&self, cycle: u64) -> CycleState {
        self.cycles.get(&cycle).copied().unwrap_or_default()
    }

    pub fn requests(&self) -> impl Iterator<Item = (&AccountId, &Request)> {
        self.requests.iter()
    }

    pub fn cycles(&self) -> impl Iterator<Item = (u64, &CycleState)> {
        self.cycles.iter().map(|(cycle, state)| (*cycle, state))
    }

    pub fn put_request(&mut self, journal: &mut Journal, account: &AccountId, request: Option<Request>) {
        journal
            .requests
            .entry(account.clone())
            .or_insert_with(|| self.requests.get(account).copied());

        match request {
            Some(request) if request.locked_shares > 0 => {
                self.requests.insert(account.clone(), request);
            }
            _ => {
                self.requests.remove(account);
            }
        }
    }

    pub fn put_cycle(&mut self, journal: &mut Journal, cycle: u64, state: CycleState) {
        journal
            .cycles
            .entry(cycle)
            .or_insert_with(|| self.cycles.get(&cycle).copied());
        self.cycles.insert(cycle, state);
    }

    /// Restore every entry recorded in `journal`
    pub fn rollback(&mut self, journal: Journal) {
        for (account, before) in journal.requests {
            match before {
                Some(request) => {
                    self.requests.insert(account, request);
                }
                None => {
                    self.requests.remove(&account);
                }
            }
        }
        for (cycle, before) in journal.cycles {
            match before {
                Some(state) => {
                    self.cycles.insert(cycle, state);
                }
                None => {
                    self.cycles.remove(&cycle);
                }
            }
        }
    }

    /// Queue `total` shares for `account` in `target`, moving its previous
    /// position (if any) out of the old bucket.
    ///
    /// When the old and new bucket coincide only `total_shares` moves; the
    /// account is already counted in `pending_withdrawals` there.
    pub fn schedule(
        &mut self,
        journal: &mut Journal,
        account: &AccountId,
        previous: Option<Request>,
        total: u128,
        target: u64,
    ) -> Result<()> {
        match previous {
            Some(prev) if prev.target_cycle == target => {
                let mut bucket = self.cycle(target);
                let added = sub_u128(total, prev.locked_shares)?;
                bucket.total_shares = add_u128(bucket.total_shares, added)?;
                self.put_cycle(journal, target, bucket);
            }
            previous => {
                if let Some(prev) = previous {
                    self.release(journal, prev.target_cycle, prev.locked_shares)?;
                }
                let mut bucket = self.cycle(target);
                bucket.total_shares = add_u128(bucket.total_shares, total)?;
                bucket.pending_withdrawals = bucket
                    .pending_withdrawals
                    .checked_add(1)
                    .ok_or(WithdrawalError::Overflow)?;
                self.put_cycle(journal, target, bucket);
            }
        }

        self.put_request(
            journal,
            account,
            Some(Request {
                locked_shares: total,
                target_cycle: target,
            }),
        );
        Ok(())
    }

    /// Take `shares` out of a cycle's bucket for an account leaving it
    pub fn release(&mut self, journal: &mut Journal, cycle: u64, shares: u128) -> Result<()> {
        let mut bucket = self.cycle(cycle);
        bucket.total_shares = sub_u128(bucket.total_shares, shares)?;
        bucket.pending_withdrawals = bucket
            .pending_withdrawals
            .checked_sub(1)
            .ok_or(WithdrawalError::Overflow)?;
        self.put_cycle(journal, cycle, bucket);
        Ok(())
    }
}
