//! Cycle-based withdrawal queue for pooled-fund shares
//!
//! Share holders lock shares into a future cycle; each cycle is settled once
//! against an external liquidity source, and its funds and unconverted shares
//! are divided pro rata among the accounts that queued in it.
//! Time and collaborators are injected per call; no ambient state.

pub mod types;
pub mod error;
pub mod math;
pub mod clock;
pub mod config;
pub mod state;
pub mod events;
pub mod interfaces;
pub mod allocator;
pub mod processor;
pub mod manager;
pub mod memory;
pub mod helpers;


// Re-export commonly used types
pub use types::*;
pub use error::*;
pub use clock::*;
pub use config::*;
pub use state::*;
pub use events::WithdrawalEvent;
pub use interfaces::*;
pub use allocator::*;
pub use manager::*;
pub use memory::*;
