//! State space sanitizer - bounds values for Kani exploration

use withdrawal_model::allocator::CycleSnapshot;

pub const MAX_CLAIMANTS: usize = 4;

/// Bounds for tractable verification
pub const MAX_SHARES: u128 = 1_000;
pub const MAX_FUNDS: u128 = 10_000;
pub const MAX_TIME: u64 = 100_000;

pub trait Sanitize {
    fn sanitize(self) -> Self;
}

impl Sanitize for CycleSnapshot {
    /// Clamp amounts and restore the shape a settled cycle always has:
    /// at least one share per pending claimant and leftover within shares.
    fn sanitize(mut self) -> CycleSnapshot {
        self.pending_withdrawals = self.pending_withdrawals.clamp(1, MAX_CLAIMANTS as u64);
        self.active_shares = (self.active_shares % MAX_SHARES).max(self.pending_withdrawals as u128);
        self.available_funds %= MAX_FUNDS;
        self.leftover_shares %= self.active_shares + 1;
        self
    }
}
