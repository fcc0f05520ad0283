//! # openodds-cpmm
//!
//! **Weighted constant-product pricing for OpenOdds.**
//!
//! The pricing plane: pure functions from pool state to prices, shares, and
//! new pool state. It has:
//!
//! - **Zero side effects**: every operation returns a new pool value
//! - **One epsilon**: all comparisons share the engine-wide tolerance
//! - **Two solve paths**: closed form at `p = 0.5`, bounded bisection
//!   otherwise, cross-validated on reference vectors
//! - **Injectable fees**: the taker-fee curve is a caller-supplied policy

pub mod fees;
pub mod liquidity;
pub mod numeric;
pub mod pricing;
pub mod sale;

pub use fees::{FeePolicy, NoFees, StandardFeePolicy};
pub use liquidity::{LiquidityLedger, ReservesReturned, add_liquidity, remove_liquidity};
pub use numeric::{Invariant, approx_eq, approx_gte, approx_lte, is_zero};
pub use pricing::{
    Purchase, amount_for_shares, amount_to_reach_prob, purchase, purchase_with_fee, sale,
};
pub use sale::{Sale, sell_shares};
