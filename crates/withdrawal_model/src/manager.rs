//! Withdrawal manager entry points
//!
//! Four calls drive the state machine:
//! - `lock_shares`: queue shares for the cycle one cooldown ahead
//! - `unlock_shares`: take shares back before the target cycle opens
//! - `process_cycle`: settle the current cycle against the pool (permissionless)
//! - `redeem_position`: claim a pro-rata slice of a settled cycle
//!
//! Each call is all-or-nothing. Ledger writes are journaled and events are
//! buffered; both are committed only when the call returns `Ok`. Within a call,
//! ledger effects are applied before the collaborators are invoked.

use serde::{Deserialize, Serialize};

use crate::allocator::{allocate, split_position, CycleSnapshot};
use crate::clock::{CycleBounds, CycleClock};
use crate::config::ManagerConfig;
use crate::error::{Result, WithdrawalError};
use crate::events::{EventBuffer, WithdrawalEvent};
use crate::interfaces::{FundsCustodian, LiquiditySource, ShareCustodian};
use crate::math::{add_u128, sub_u128};
use crate::processor::settle_cycle;
use crate::state::{CycleState, Journal, Request, WithdrawalLedger};
use crate::types::{AccountId, CallContext};

/// Scratch state of the call in progress
#[derive(Debug, Default)]
pub(crate) struct CallFrame {
    pub(crate) journal: Journal,
    pub(crate) events: EventBuffer,
}

/// Result of `redeem_position`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RedeemOutcome {
    pub funds_withdrawn: u128,
    pub redeemed_shares: u128,
    pub reclaimed_shares: u128,
}

/// Result of `process_cycle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedCycle {
    pub cycle: u64,
    pub available_funds: u128,
    pub leftover_shares: u128,
}

#[derive(Debug, Clone)]
pub struct WithdrawalManager {
    config: ManagerConfig,
    clock: CycleClock,
    /// Account holding locked shares and settled funds in the custodians
    custody: AccountId,
    ledger: WithdrawalLedger,
    events: Vec<WithdrawalEvent>,
}

impl WithdrawalManager {
    pub fn new(config: ManagerConfig, custody: impl Into<AccountId>) -> Result<Self> {
        let clock = config.clock()?;
        let custody = custody.into();
        log::info!(
            "withdrawal manager {} for pool {} / asset {}: start={} duration={} frequency={} cooldown={}",
            custody,
            config.pool,
            config.asset,
            clock.period_start(),
            clock.period_duration(),
            clock.period_frequency(),
            clock.cooldown()
        );
        Ok(Self {
            config,
            clock,
            custody,
            ledger: WithdrawalLedger::new(),
            events: Vec::new(),
        })
    }

    /// Run one entry point: commit buffered events on `Ok`, roll the ledger
    /// back from the journal on `Err`.
    ///
    /// Only the manager's own state is restored. Collaborator calls that
    /// succeeded before the failure (a settlement redeem, a funds transfer
    /// ahead of a failed share transfer) stay applied unless the host runs the
    /// whole call as one transaction and discards it on `Err`.
    fn run<T>(
        &mut self,
        op: &'static str,
        call: impl FnOnce(&mut Self, &mut CallFrame) -> Result<T>,
    ) -> Result<T> {
        let mut frame = CallFrame::default();
        match call(self, &mut frame) {
            Ok(value) => {
                self.events.extend(frame.events.into_inner());
                Ok(value)
            }
            Err(err) => {
                log::warn!("{} rejected: {}", op, err);
                self.ledger.rollback(frame.journal);
                Err(err)
            }
        }
    }

    /// Lock `amount` more shares for the caller. Returns the total locked.
    ///
    /// The whole position (old and new shares) is rescheduled one cooldown
    /// from now. Adding to a request whose target cycle has already opened
    /// fails with `WithdrawDue`; that request must be redeemed first.
    pub fn lock_shares<H>(&mut self, host: &mut H, ctx: &CallContext, amount: u128) -> Result<u128>
    where
        H: ShareCustodian + ?Sized,
    {
        self.run("lock_shares", |manager, frame| {
            if amount == 0 {
                return Err(WithdrawalError::ZeroAmount);
            }
            let account = &ctx.caller;
            let current = manager.clock.cycle_of(ctx.now);
            let previous = manager.ledger.request(account).copied();

            if let Some(prev) = previous {
                if current >= prev.target_cycle {
                    return Err(WithdrawalError::WithdrawDue {
                        cycle: prev.target_cycle,
                        current,
                    });
                }
            }

            let target = manager.clock.next_target_cycle(ctx.now)?;
            let total = add_u128(previous.map_or(0, |r| r.locked_shares), amount)?;
            manager
                .ledger
                .schedule(&mut frame.journal, account, previous, total, target)?;

            host.transfer_shares_from(account, &manager.custody, amount)?;

            log::debug!("{} locked {} shares, {} total for cycle {}", account, amount, total, target);
            frame.events.emit(WithdrawalEvent::SharesLocked {
                account: account.clone(),
                shares: amount,
            });
            frame.events.emit(WithdrawalEvent::WithdrawalPending {
                account: account.clone(),
                cycle: target,
            });
            Ok(total)
        })
    }

    /// Return `amount` locked shares to the caller. Returns the shares still locked.
    pub fn unlock_shares<H>(&mut self, host: &mut H, ctx: &CallContext, amount: u128) -> Result<u128>
    where
        H: ShareCustodian + ?Sized,
    {
        self.run("unlock_shares", |manager, frame| {
            if amount == 0 {
                return Err(WithdrawalError::ZeroAmount);
            }
            let account = &ctx.caller;
            let request = manager
                .ledger
                .request(account)
                .copied()
                .ok_or(WithdrawalError::NoRequest)?;

            let current = manager.clock.cycle_of(ctx.now);
            if current >= request.target_cycle {
                return Err(WithdrawalError::WithdrawDue {
                    cycle: request.target_cycle,
                    current,
                });
            }
            if amount > request.locked_shares {
                return Err(WithdrawalError::InsufficientShares {
                    requested: amount,
                    locked: request.locked_shares,
                });
            }

            let remaining = request.locked_shares - amount;
            if remaining == 0 {
                manager
                    .ledger
                    .release(&mut frame.journal, request.target_cycle, amount)?;
            } else {
                let mut bucket = manager.ledger.cycle(request.target_cycle);
                bucket.total_shares = sub_u128(bucket.total_shares, amount)?;
                manager
                    .ledger
                    .put_cycle(&mut frame.journal, request.target_cycle, bucket);
            }
            manager.ledger.put_request(
                &mut frame.journal,
                account,
                Some(Request {
                    locked_shares: remaining,
                    target_cycle: request.target_cycle,
                }),
            );

            host.transfer_shares(&manager.custody, account, amount)?;

            frame.events.emit(WithdrawalEvent::SharesUnlocked {
                account: account.clone(),
                shares: amount,
            });
            if remaining == 0 {
                frame.events.emit(WithdrawalEvent::WithdrawalCancelled {
                    account: account.clone(),
                });
            }
            Ok(remaining)
        })
    }

    /// Settle the cycle containing `ctx.now`. Anyone may call this once per cycle.
    pub fn process_cycle<H>(&mut self, host: &mut H, ctx: &CallContext) -> Result<ProcessedCycle>
    where
        H: LiquiditySource + ?Sized,
    {
        self.run("process_cycle", |manager, frame| {
            let cycle = manager.clock.cycle_of(ctx.now);
            let state = settle_cycle(
                &mut manager.ledger,
                frame,
                &manager.clock,
                &manager.custody,
                host,
                cycle,
                ctx.now,
            )?;
            Ok(ProcessedCycle {
                cycle,
                available_funds: state.available_funds,
                leftover_shares: state.leftover_shares,
            })
        })
    }

    /// Claim the caller's share of its target cycle.
    ///
    /// Settles the cycle first if nobody has yet. The caller receives its
    /// pro-rata funds and up to `shares_to_reclaim` of its leftover shares;
    /// any leftover it does not reclaim is queued again one cooldown ahead.
    pub fn redeem_position<H>(
        &mut self,
        host: &mut H,
        ctx: &CallContext,
        shares_to_reclaim: u128,
    ) -> Result<RedeemOutcome>
    where
        H: ShareCustodian + FundsCustodian + LiquiditySource + ?Sized,
    {
        self.run("redeem_position", |manager, frame| {
            let account = &ctx.caller;
            let request = manager
                .ledger
                .request(account)
                .copied()
                .ok_or(WithdrawalError::NoRequest)?;

            let cycle = request.target_cycle;
            let bounds = manager.clock.bounds_of(cycle)?;
            if ctx.now < bounds.start {
                return Err(WithdrawalError::EarlyWithdraw {
                    opens_at: bounds.start,
                    now: ctx.now,
                });
            }

            let mut state = manager.ledger.cycle(cycle);
            if !state.is_processed {
                state = settle_cycle(
                    &mut manager.ledger,
                    frame,
                    &manager.clock,
                    &manager.custody,
                    host,
                    cycle,
                    ctx.now,
                )?;
            }

            let personal_shares = request.locked_shares;
            let allocation = allocate(&CycleSnapshot::from(&state), personal_shares)?;
            let split = split_position(personal_shares, &allocation, shares_to_reclaim)?;

            state.available_funds = sub_u128(state.available_funds, allocation.funds)?;
            state.leftover_shares = sub_u128(state.leftover_shares, allocation.leftover_shares)?;
            manager.ledger.put_cycle(&mut frame.journal, cycle, state);
            manager
                .ledger
                .release(&mut frame.journal, cycle, personal_shares)?;
            manager.ledger.put_request(&mut frame.journal, account, None);

            let mut requeued = None;
            if split.remaining_shares > 0 {
                let target = manager.clock.next_target_cycle(ctx.now)?;
                manager.ledger.schedule(
                    &mut frame.journal,
                    account,
                    None,
                    split.remaining_shares,
                    target,
                )?;
                requeued = Some(target);
            }

            if allocation.funds > 0 {
                host.transfer_funds(&manager.custody, account, allocation.funds)?;
                frame.events.emit(WithdrawalEvent::FundsWithdrawn {
                    account: account.clone(),
                    funds: allocation.funds,
                });
            }
            if split.reclaimed_shares > 0 {
                host.transfer_shares(&manager.custody, account, split.reclaimed_shares)?;
                frame.events.emit(WithdrawalEvent::SharesUnlocked {
                    account: account.clone(),
                    shares: split.reclaimed_shares,
                });
            }
            if let Some(target) = requeued {
                frame.events.emit(WithdrawalEvent::WithdrawalPending {
                    account: account.clone(),
                    cycle: target,
                });
            }

            log::debug!(
                "{} redeemed from cycle {}: funds={} redeemed={} reclaimed={} requeued={}",
                account,
                cycle,
                allocation.funds,
                split.redeemed_shares,
                split.reclaimed_shares,
                split.remaining_shares
            );
            Ok(RedeemOutcome {
                funds_withdrawn: allocation.funds,
                redeemed_shares: split.redeemed_shares,
                reclaimed_shares: split.reclaimed_shares,
            })
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    pub fn ledger(&self) -> &WithdrawalLedger {
        &self.ledger
    }

    pub fn request(&self, account: &AccountId) -> Option<&Request> {
        self.ledger.request(account)
    }

    pub fn locked_shares(&self, account: &AccountId) -> u128 {
        self.request(account).map_or(0, |r| r.locked_shares)
    }

    /// Target cycle of the account's request, 0 when it has none
    pub fn target_cycle(&self, account: &AccountId) -> u64 {
        self.request(account).map_or(0, |r| r.target_cycle)
    }

    pub fn cycle(&self, cycle: u64) -> CycleState {
        self.ledger.cycle(cycle)
    }

    pub fn total_shares(&self, cycle: u64) -> u128 {
        self.cycle(cycle).total_shares
    }

    pub fn pending_withdrawals(&self, cycle: u64) -> u64 {
        self.cycle(cycle).pending_withdrawals
    }

    pub fn available_funds(&self, cycle: u64) -> u128 {
        self.cycle(cycle).available_funds
    }

    pub fn leftover_shares(&self, cycle: u64) -> u128 {
        self.cycle(cycle).leftover_shares
    }

    pub fn is_processed(&self, cycle: u64) -> bool {
        self.cycle(cycle).is_processed
    }

    pub fn current_cycle(&self, now: u64) -> u64 {
        self.clock.cycle_of(now)
    }

    pub fn cycle_bounds(&self, cycle: u64) -> Result<CycleBounds> {
        self.clock.bounds_of(cycle)
    }

    /// Committed events not yet drained
    pub fn events(&self) -> &[WithdrawalEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<WithdrawalEvent> {
        std::mem::take(&mut self.events)
    }
}
