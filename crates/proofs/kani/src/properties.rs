//! Kani proofs for the cycle clock

use kani::{any, assume};
use withdrawal_model::clock::CycleClock;

use crate::sanitizer::MAX_TIME;

fn any_clock() -> CycleClock {
    let start: u16 = any();
    let duration: u8 = any();
    let frequency: u8 = any();
    let multiplier: u8 = any();
    assume(frequency > 0 && multiplier > 0);
    assume(duration <= frequency);

    CycleClock::new(start as u64, duration as u64, frequency as u64, multiplier as u64).unwrap()
}

/// Later timestamps never map to earlier cycles
#[kani::proof]
fn cycle_of_monotone() {
    let clock = any_clock();
    let a: u64 = any();
    let b: u64 = any();
    assume(a <= b && b <= MAX_TIME);

    kani::assert(clock.cycle_of(a) <= clock.cycle_of(b), "cycle_of not monotone");
}

/// Every timestamp inside a window maps back to that window's cycle
#[kani::proof]
fn window_maps_to_own_cycle() {
    let clock = any_clock();
    let cycle: u8 = any();
    let offset: u8 = any();
    let bounds = clock.bounds_of(cycle as u64).unwrap();
    assume((offset as u64) < bounds.end - bounds.start);

    let t = bounds.start + offset as u64;
    kani::assert(bounds.contains(t), "window excludes its own time");
    kani::assert(clock.cycle_of(t) == cycle as u64, "window maps to another cycle");
}

/// Windows of consecutive cycles never overlap
#[kani::proof]
fn windows_disjoint() {
    let clock = any_clock();
    let cycle: u8 = any();
    let this = clock.bounds_of(cycle as u64).unwrap();
    let next = clock.bounds_of(cycle as u64 + 1).unwrap();

    kani::assert(this.end <= next.start, "windows overlap");
}

/// Requests always target a cycle strictly after the current one
#[kani::proof]
fn target_after_current() {
    let clock = any_clock();
    let now: u64 = any();
    assume(now <= MAX_TIME);

    let target = clock.next_target_cycle(now).unwrap();
    kani::assert(target >= clock.cycle_of(now), "target before current cycle");
    if now >= clock.period_start() {
        kani::assert(target > clock.cycle_of(now), "target not after current cycle");
    }
}
