//! # openodds-settlement
//!
//! **Resolution payouts and value-conservation checks.**
//!
//! The terminal stage of a contract's life: given the final pool state,
//! the recorded bets and liquidity events, and the resolution, compute
//! who gets paid what. Everything is pure and re-runnable; the caller
//! owns applying the payout lines to balances.

pub mod conservation;
pub mod payouts;

pub use conservation::{ConservationReport, check_conservation};
pub use payouts::compute_payouts;
