//! Cycle clock: pure time -> cycle mapping
//!
//! Cycles start every `period_frequency` seconds from `period_start`. Each
//! cycle's redemption window is the first `period_duration` seconds of it, so
//! windows of consecutive cycles never overlap.

use crate::error::{Result, WithdrawalError};
use crate::math::{add_u64, mul_u64};

/// Half-open redemption window `[start, end)` of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBounds {
    pub start: u64,
    pub end: u64,
}

impl CycleBounds {
    pub fn contains(&self, time: u64) -> bool {
        self.start <= time && time < self.end
    }

    /// Window has closed at `time`
    pub fn has_elapsed(&self, time: u64) -> bool {
        time >= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleClock {
    period_start: u64,
    period_duration: u64,
    period_frequency: u64,
    cooldown_multiplier: u64,
    cooldown: u64,
}

impl CycleClock {
    pub fn new(
        period_start: u64,
        period_duration: u64,
        period_frequency: u64,
        cooldown_multiplier: u64,
    ) -> Result<Self> {
        if period_frequency == 0 {
            return Err(WithdrawalError::Config(
                "period frequency must be nonzero".into(),
            ));
        }
        if period_duration > period_frequency {
            return Err(WithdrawalError::Config(format!(
                "period duration {} exceeds period frequency {}",
                period_duration, period_frequency
            )));
        }
        if cooldown_multiplier == 0 {
            return Err(WithdrawalError::Config(
                "cooldown multiplier must be nonzero".into(),
            ));
        }
        let cooldown = mul_u64(period_frequency, cooldown_multiplier)
            .map_err(|_| WithdrawalError::Config("cooldown overflows u64".into()))?;

        Ok(Self {
            period_start,
            period_duration,
            period_frequency,
            cooldown_multiplier,
            cooldown,
        })
    }

    pub fn period_start(&self) -> u64 {
        self.period_start
    }

    pub fn period_duration(&self) -> u64 {
        self.period_duration
    }

    pub fn period_frequency(&self) -> u64 {
        self.period_frequency
    }

    pub fn cooldown_multiplier(&self) -> u64 {
        self.cooldown_multiplier
    }

    /// Delay between locking and the earliest eligible cycle
    pub fn cooldown(&self) -> u64 {
        self.cooldown
    }

    pub fn cycle_of(&self, time: u64) -> u64 {
        if time <= self.period_start {
            0
        } else {
            (time - self.period_start) / self.period_frequency
        }
    }

    pub fn bounds_of(&self, cycle: u64) -> Result<CycleBounds> {
        let offset = mul_u64(cycle, self.period_frequency)?;
        let start = add_u64(self.period_start, offset)?;
        let end = add_u64(start, self.period_duration)?;
        Ok(CycleBounds { start, end })
    }

    /// Target cycle for a position locked at `now`
    pub fn next_target_cycle(&self, now: u64) -> Result<u64> {
        Ok(self.cycle_of(add_u64(now, self.cooldown)?))
    }
}
