//! Kani proofs for the withdrawal model
//!
//! Harnesses only build under `cargo kani`; the generators and sanitizer are
//! plain Rust so they can be unit-tested.

#![cfg_attr(kani, feature(register_tool), register_tool(kanitool))]

pub mod sanitizer;
pub mod generators;

#[cfg(kani)]
pub mod safety;
#[cfg(kani)]
pub mod properties;
