//! Construction-time manager configuration

use serde::{Deserialize, Serialize};

use crate::clock::CycleClock;
use crate::error::Result;
use crate::types::AccountId;

/// Immutable parameters of one manager instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Pool whose shares are queued and which supplies liquidity
    pub pool: AccountId,

    /// Settlement asset paid out to redeemers
    pub asset: AccountId,

    /// Start of cycle 0 (seconds)
    pub period_start: u64,

    /// Length of each cycle's redemption window (seconds)
    pub period_duration: u64,

    /// Spacing between consecutive cycle starts (seconds)
    pub period_frequency: u64,

    /// Cooldown in whole cycles
    pub cooldown_multiplier: u64,
}

impl ManagerConfig {
    /// Validate the cycle parameters into a clock
    pub fn clock(&self) -> Result<CycleClock> {
        CycleClock::new(
            self.period_start,
            self.period_duration,
            self.period_frequency,
            self.cooldown_multiplier,
        )
    }
}
