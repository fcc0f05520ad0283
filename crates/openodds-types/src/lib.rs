//! # openodds-types
//!
//! Shared types, errors, and constants for the **OpenOdds** prediction-market
//! engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`UserId`], [`ContractId`], [`AnswerId`], [`FillId`]
//! - **Pool model**: [`AmmPool`], [`Outcome`]
//! - **Contract model**: [`Contract`], [`ContractKind`], [`Answer`]
//! - **Order model**: [`LimitOrder`], [`BetRequest`], [`ProbKey`]
//! - **Trade model**: [`Fill`], [`FillSource`], [`OrderDiff`], [`Bet`], [`SharePosition`]
//! - **Liquidity model**: [`LiquidityProvision`], [`LiquidityDirection`]
//! - **Resolution model**: [`Resolution`], [`Payout`], [`PayoutKind`]
//! - **Fees**: [`Fees`], [`split_fee`]
//! - **Errors**: [`OpenoddsError`] with `OD_ERR_` prefix codes
//! - **Constants**: the shared epsilon, probability bounds, iteration caps

pub mod bet;
pub mod constants;
pub mod contract;
pub mod error;
pub mod fees;
pub mod fill;
pub mod ids;
pub mod liquidity;
pub mod order;
pub mod outcome;
pub mod pool;
pub mod resolution;

// Re-export all primary types at crate root for ergonomic imports:
//   use openodds_types::{AmmPool, BetRequest, Fill, Resolution, ...};

pub use bet::*;
pub use contract::*;
pub use error::*;
pub use fees::*;
pub use fill::*;
pub use ids::*;
pub use liquidity::*;
pub use order::*;
pub use outcome::*;
pub use pool::*;
pub use resolution::*;

// Constants are accessed via `openodds_types::constants::FOO`
// (not re-exported to avoid name collisions).
