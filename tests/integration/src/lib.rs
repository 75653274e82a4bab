//! Withdrawal Integration Tests
//!
//! Multi-account scenarios driven through a sandbox that hosts one manager
//! and one in-memory pool on a simulated clock. A failed call restores both,
//! as a transactional runtime would.

use withdrawal_model::helpers::{
    buckets_consistent, expected_custody_funds, expected_custody_shares, no_empty_requests,
    settlement_bounded,
};
use withdrawal_model::{
    AccountId, CallContext, ManagerConfig, MemoryPool, ProcessedCycle, RedeemOutcome, Result,
    WithdrawalManager,
};

pub const CUSTODY: &str = "manager";
pub const LP: &str = "lp";

pub struct Sandbox {
    pub manager: WithdrawalManager,
    pub pool: MemoryPool,
    pub now: u64,
}

impl Sandbox {
    pub fn new(config: ManagerConfig) -> Self {
        let pool = MemoryPool::new(config.pool.clone());
        let manager = WithdrawalManager::new(config, CUSTODY).expect("valid manager config");
        Self {
            manager,
            pool,
            now: 0,
        }
    }

    /// Cycles of 100s with a 10s window and a two-cycle cooldown, over a pool
    /// seeded with 1000 from the LP
    pub fn standard() -> Self {
        let mut sandbox = Self::new(ManagerConfig {
            pool: "pool".into(),
            asset: "usdc".into(),
            period_start: 0,
            period_duration: 10,
            period_frequency: 100,
            cooldown_multiplier: 2,
        });
        sandbox.fund(LP, 1_000);
        sandbox
    }

    pub fn warp(&mut self, now: u64) {
        assert!(now >= self.now, "clock moves forward only");
        log::debug!("warp {} -> {}", self.now, now);
        self.now = now;
    }

    /// Mint funds to `name` and deposit them. Returns the shares minted.
    pub fn fund(&mut self, name: &str, amount: u128) -> u128 {
        let account = AccountId::from(name);
        self.pool.mint_funds(&account, amount);
        self.pool.deposit(&account, amount).expect("deposit")
    }

    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut WithdrawalManager, &mut MemoryPool) -> Result<T>,
    ) -> Result<T> {
        let snapshot = (self.manager.clone(), self.pool.clone());
        let result = op(&mut self.manager, &mut self.pool);
        if result.is_err() {
            (self.manager, self.pool) = snapshot;
        }
        result
    }

    pub fn lock(&mut self, name: &str, amount: u128) -> Result<u128> {
        let ctx = CallContext::new(name, self.now);
        self.transact(|manager, pool| manager.lock_shares(pool, &ctx, amount))
    }

    pub fn unlock(&mut self, name: &str, amount: u128) -> Result<u128> {
        let ctx = CallContext::new(name, self.now);
        self.transact(|manager, pool| manager.unlock_shares(pool, &ctx, amount))
    }

    pub fn process(&mut self) -> Result<ProcessedCycle> {
        let ctx = CallContext::new("keeper", self.now);
        self.transact(|manager, pool| manager.process_cycle(pool, &ctx))
    }

    pub fn redeem(&mut self, name: &str, shares_to_reclaim: u128) -> Result<RedeemOutcome> {
        let ctx = CallContext::new(name, self.now);
        self.transact(|manager, pool| manager.redeem_position(pool, &ctx, shares_to_reclaim))
    }

    pub fn shares(&self, name: &str) -> u128 {
        self.pool.share_balance(&AccountId::from(name))
    }

    pub fn funds(&self, name: &str) -> u128 {
        self.pool.funds_balance(&AccountId::from(name))
    }

    pub fn locked(&self, name: &str) -> u128 {
        self.manager.locked_shares(&AccountId::from(name))
    }

    /// Ledger consistency plus custody balances matching the ledger
    pub fn assert_invariants(&self) {
        let ledger = self.manager.ledger();
        assert!(buckets_consistent(ledger), "bucket totals drifted from requests");
        assert!(no_empty_requests(ledger), "empty request left in ledger");
        assert!(settlement_bounded(ledger), "settled amounts out of bounds");

        let custody = AccountId::from(CUSTODY);
        assert_eq!(
            self.pool.share_balance(&custody),
            expected_custody_shares(ledger),
            "custody shares"
        );
        assert_eq!(
            self.pool.funds_balance(&custody),
            expected_custody_funds(ledger),
            "custody funds"
        );
    }
}
