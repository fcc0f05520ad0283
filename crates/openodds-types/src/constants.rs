//! System-wide constants for the OpenOdds engine.

/// Shared tolerance for every floating-point comparison in the engine.
///
/// All monetary and share quantities are `f64`; any equality or ordering
/// check that must absorb rounding error goes through this constant rather
/// than an ad hoc per-call-site tolerance.
pub const EPSILON: f64 = 1e-9;

/// Lowest probability a CPMM pool is allowed to quote.
pub const MIN_CPMM_PROB: f64 = 0.01;

/// Highest probability a CPMM pool is allowed to quote.
pub const MAX_CPMM_PROB: f64 = 0.99;

/// Minimum share quantity either pool reserve may hold.
///
/// A trade that would push a reserve below this floor is rejected with
/// `OD_ERR_201` instead of being clamped.
pub const MIN_POOL_SHARES: f64 = 1e-6;

/// Iteration cap for the multi-answer arbitrage solver.
pub const MAX_ARBITRAGE_ITERATIONS: usize = 100;

/// Tolerance for the sum-to-one check on entry to the arbitrage solver.
/// Looser than [`EPSILON`] because stored pools accumulate rounding drift
/// between trades.
pub const SUM_TO_ONE_TOLERANCE: f64 = 1e-4;

/// Iteration cap for the bounded bisection invariant solve.
pub const MAX_BISECTION_ITERATIONS: usize = 200;

/// Fraction of each taker fee routed to the platform.
pub const PLATFORM_FEE_SHARE: f64 = 0.5;

/// Fraction of each taker fee routed to the question creator.
pub const CREATOR_FEE_SHARE: f64 = 0.3;

/// Fraction of each taker fee routed to the liquidity pool subsidy.
pub const POOL_FEE_SHARE: f64 = 0.2;

/// Base rate for the standard taker-fee curve.
pub const STANDARD_FEE_RATE: f64 = 0.07;

/// Hard cap on the taker fee as a fraction of the amount filled.
pub const MAX_FEE_FRACTION: f64 = 0.05;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenOdds";
