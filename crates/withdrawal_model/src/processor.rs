//! Redemption processor: one-time settlement of a cycle
//!
//! Settlement converts as much of a cycle's queued shares into funds as the
//! liquidity source can honor. It runs at most once per cycle, guarded by
//! `is_processed`, either from `process_cycle` or lazily from the first
//! redeem against an unprocessed cycle.

use crate::clock::CycleClock;
use crate::error::{Result, WithdrawalError};
use crate::events::WithdrawalEvent;
use crate::interfaces::LiquiditySource;
use crate::manager::CallFrame;
use crate::math::{min_u128, sub_u128};
use crate::state::{CycleState, WithdrawalLedger};
use crate::types::AccountId;

/// Settle `cycle` at time `now`.
///
/// Fails if the cycle is already processed or its window has not opened.
/// If the cycle's window has already closed, nothing is converted and every
/// queued share becomes leftover. Otherwise the pool is asked for its unlocked
/// funds, and the share-equivalent (capped at the cycle's shares) is redeemed.
/// The processed flag and leftover are written before the pool is called.
pub(crate) fn settle_cycle<P>(
    ledger: &mut WithdrawalLedger,
    frame: &mut CallFrame,
    clock: &CycleClock,
    custody: &AccountId,
    pool: &mut P,
    cycle: u64,
    now: u64,
) -> Result<CycleState>
where
    P: LiquiditySource + ?Sized,
{
    let mut state = ledger.cycle(cycle);
    if state.is_processed {
        return Err(WithdrawalError::DoubleProcess { cycle });
    }

    let bounds = clock.bounds_of(cycle)?;
    if now < bounds.start {
        return Err(WithdrawalError::CycleNotOpen {
            cycle,
            opens_at: bounds.start,
            now,
        });
    }

    if bounds.has_elapsed(now) {
        state.leftover_shares = state.total_shares;
        state.available_funds = 0;
        state.is_processed = true;
        ledger.put_cycle(&mut frame.journal, cycle, state);

        log::warn!(
            "cycle {} processed after its window closed at {}; {} shares left unconverted",
            cycle,
            bounds.end,
            state.leftover_shares
        );
        frame.events.emit(WithdrawalEvent::CycleProcessed {
            cycle,
            funds: 0,
            leftover: state.leftover_shares,
        });
        return Ok(state);
    }

    let unlocked = pool.unlocked_balance();
    let redeemable = pool.preview_withdraw(unlocked);
    let shares_to_redeem = min_u128(redeemable, state.total_shares);

    state.leftover_shares = sub_u128(state.total_shares, shares_to_redeem)?;
    state.available_funds = 0;
    state.is_processed = true;
    ledger.put_cycle(&mut frame.journal, cycle, state);

    if shares_to_redeem > 0 {
        state.available_funds = pool.redeem(custody, shares_to_redeem)?;
        ledger.put_cycle(&mut frame.journal, cycle, state);
    }

    log::info!(
        "cycle {} settled: unlocked={} redeemed_shares={} funds={} leftover={}",
        cycle,
        unlocked,
        shares_to_redeem,
        state.available_funds,
        state.leftover_shares
    );
    frame.events.emit(WithdrawalEvent::CycleProcessed {
        cycle,
        funds: state.available_funds,
        leftover: state.leftover_shares,
    });

    Ok(state)
}
