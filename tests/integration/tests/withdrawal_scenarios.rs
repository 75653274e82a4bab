//! Multi-account withdrawal scenarios
//!
//! Standard sandbox: cycles every 100s, window [100c, 100c + 10), cooldown 200s.
//! Shares lock at t = 0 target cycle 2.

use withdrawal_integration_tests::Sandbox;
use withdrawal_model::{AccountId, WithdrawalError, WithdrawalEvent};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_full_liquidity_pays_every_holder() {
    init_logging();
    let mut sb = Sandbox::standard();
    sb.fund("alice", 300);
    sb.fund("bob", 700);
    sb.lock("alice", 300).unwrap();
    sb.lock("bob", 700).unwrap();
    sb.assert_invariants();

    sb.warp(200);
    let processed = sb.process().unwrap();
    assert_eq!(processed.cycle, 2);
    assert_eq!(processed.available_funds, 1_000);
    assert_eq!(processed.leftover_shares, 0);
    sb.assert_invariants();

    sb.warp(205);
    let alice = sb.redeem("alice", u128::MAX).unwrap();
    let bob = sb.redeem("bob", u128::MAX).unwrap();

    assert_eq!(alice.funds_withdrawn, 300);
    assert_eq!(bob.funds_withdrawn, 700);
    assert_eq!(sb.funds("alice"), 300);
    assert_eq!(sb.funds("bob"), 700);
    assert_eq!(sb.locked("alice"), 0);
    assert_eq!(sb.manager.pending_withdrawals(2), 0);
    assert_eq!(sb.pool.total_supply(), 1_000);
    sb.assert_invariants();
}

#[test]
fn test_partial_liquidity_requeues_leftover() {
    init_logging();
    let mut sb = Sandbox::standard();
    sb.fund("alice", 300);
    sb.fund("bob", 700);
    sb.lock("alice", 300).unwrap();
    sb.lock("bob", 700).unwrap();

    // 500 of 2000 stays as cash
    sb.pool.lend(1_500).unwrap();

    sb.warp(200);
    let processed = sb.process().unwrap();
    assert_eq!(processed.available_funds, 500);
    assert_eq!(processed.leftover_shares, 500);

    // Alice keeps her leftover queued, Bob takes his back
    sb.warp(205);
    let alice = sb.redeem("alice", 0).unwrap();
    assert_eq!(alice.funds_withdrawn, 150);
    assert_eq!(alice.redeemed_shares, 150);
    assert_eq!(alice.reclaimed_shares, 0);
    assert_eq!(sb.locked("alice"), 150);
    assert_eq!(sb.manager.target_cycle(&AccountId::from("alice")), 4);

    let bob = sb.redeem("bob", u128::MAX).unwrap();
    assert_eq!(bob.funds_withdrawn, 350);
    assert_eq!(bob.reclaimed_shares, 350);
    assert_eq!(sb.shares("bob"), 350);
    sb.assert_invariants();

    sb.pool.repay(1_500);
    sb.warp(400);
    let processed = sb.process().unwrap();
    assert_eq!(processed.cycle, 4);
    assert_eq!(processed.available_funds, 150);

    sb.warp(401);
    let alice = sb.redeem("alice", u128::MAX).unwrap();
    assert_eq!(alice.funds_withdrawn, 150);
    assert_eq!(sb.funds("alice"), 300);
    assert_eq!(sb.locked("alice"), 0);
    sb.assert_invariants();
}

#[test]
fn test_missed_window_returns_shares() {
    init_logging();
    let mut sb = Sandbox::standard();
    sb.fund("alice", 100);
    sb.lock("alice", 100).unwrap();

    // Window of cycle 2 closed at 210 with nobody processing it
    sb.warp(250);
    let outcome = sb.redeem("alice", u128::MAX).unwrap();

    assert_eq!(outcome.funds_withdrawn, 0);
    assert_eq!(outcome.redeemed_shares, 0);
    assert_eq!(outcome.reclaimed_shares, 100);
    assert_eq!(sb.shares("alice"), 100);
    assert!(sb.manager.is_processed(2));
    assert!(sb.manager.events().contains(&WithdrawalEvent::CycleProcessed {
        cycle: 2,
        funds: 0,
        leftover: 100,
    }));
    sb.assert_invariants();
}

#[test]
fn test_unlock_and_relock_before_due() {
    init_logging();
    let mut sb = Sandbox::standard();
    sb.fund("alice", 100);
    sb.lock("alice", 100).unwrap();

    sb.warp(50);
    assert_eq!(sb.unlock("alice", 40).unwrap(), 60);
    assert_eq!(sb.shares("alice"), 40);
    sb.assert_invariants();

    // Topping up reschedules the whole position
    sb.warp(150);
    assert_eq!(sb.lock("alice", 10).unwrap(), 70);
    assert_eq!(sb.manager.target_cycle(&AccountId::from("alice")), 3);
    assert_eq!(sb.manager.total_shares(2), 0);
    assert_eq!(sb.manager.pending_withdrawals(2), 0);
    assert_eq!(sb.manager.total_shares(3), 70);
    assert_eq!(sb.manager.pending_withdrawals(3), 1);
    sb.assert_invariants();

    sb.warp(300);
    assert_eq!(
        sb.unlock("alice", 1),
        Err(WithdrawalError::WithdrawDue { cycle: 3, current: 3 })
    );
    assert_eq!(
        sb.lock("alice", 1),
        Err(WithdrawalError::WithdrawDue { cycle: 3, current: 3 })
    );
    sb.assert_invariants();
}

#[test]
fn test_failed_redeem_leaves_cycle_unsettled() {
    init_logging();
    let mut sb = Sandbox::standard();
    sb.fund("alice", 100);
    sb.fund("bob", 100);
    sb.lock("alice", 100).unwrap();
    sb.lock("bob", 100).unwrap();

    sb.warp(205);
    sb.pool.freeze(&AccountId::from("alice"));
    let pool_before = sb.pool.clone();

    let result = sb.redeem("alice", u128::MAX);
    assert!(matches!(result, Err(WithdrawalError::Transfer(_))));
    assert!(!sb.manager.is_processed(2));
    assert_eq!(sb.pool, pool_before);
    sb.assert_invariants();

    // Bob's redeem settles the cycle instead
    let bob = sb.redeem("bob", u128::MAX).unwrap();
    assert_eq!(bob.funds_withdrawn, 100);
    assert!(sb.manager.is_processed(2));

    sb.pool.unfreeze(&AccountId::from("alice"));
    let alice = sb.redeem("alice", u128::MAX).unwrap();
    assert_eq!(alice.funds_withdrawn, 100);
    sb.assert_invariants();
}

#[test]
fn test_yield_raises_payout() {
    init_logging();
    let mut sb = Sandbox::standard();
    sb.fund("alice", 100);
    sb.lock("alice", 100).unwrap();

    // Rate goes from 1.0 to 1.1
    sb.pool.accrue_yield(110);

    sb.warp(200);
    let processed = sb.process().unwrap();
    assert_eq!(processed.available_funds, 110);
    assert_eq!(processed.leftover_shares, 0);

    let outcome = sb.redeem("alice", u128::MAX).unwrap();
    assert_eq!(outcome.funds_withdrawn, 110);
    assert_eq!(outcome.redeemed_shares, 100);
    sb.assert_invariants();
}

#[test]
fn test_process_rejections() {
    init_logging();
    let mut sb = Sandbox::standard();
    sb.fund("alice", 100);
    sb.lock("alice", 100).unwrap();

    sb.warp(200);
    sb.process().unwrap();
    assert_eq!(sb.process(), Err(WithdrawalError::DoubleProcess { cycle: 2 }));

    assert_eq!(sb.redeem("nobody", 0), Err(WithdrawalError::NoRequest));
    sb.assert_invariants();
}

#[test]
fn test_events_follow_lifecycle() {
    init_logging();
    let mut sb = Sandbox::standard();
    sb.fund("alice", 100);
    sb.lock("alice", 100).unwrap();
    sb.warp(200);
    sb.process().unwrap();
    sb.redeem("alice", u128::MAX).unwrap();

    let alice = AccountId::from("alice");
    assert_eq!(
        sb.manager.events(),
        &[
            WithdrawalEvent::SharesLocked { account: alice.clone(), shares: 100 },
            WithdrawalEvent::WithdrawalPending { account: alice.clone(), cycle: 2 },
            WithdrawalEvent::CycleProcessed { cycle: 2, funds: 100, leftover: 0 },
            WithdrawalEvent::FundsWithdrawn { account: alice, funds: 100 },
        ]
    );
}
