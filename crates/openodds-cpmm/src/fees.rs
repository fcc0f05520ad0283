//! Injectable taker-fee policy.
//!
//! The fee curve has changed over the platform's history, so it is a trait
//! the caller supplies rather than a formula baked into the solver. The
//! split across platform / creator / pool stays fixed in
//! [`openodds_types::split_fee`].

use openodds_types::constants::{MAX_FEE_FRACTION, STANDARD_FEE_RATE};

/// Quotes the taker fee for one fill.
pub trait FeePolicy {
    /// Fee charged on `amount`, given the probability move the fill causes.
    ///
    /// A maker fill moves nothing (`prob_before == prob_after`) and must
    /// quote zero.
    fn taker_fee(&self, amount: f64, prob_before: f64, prob_after: f64) -> f64;
}

/// The production fee curve: proportional to probability displacement,
/// steepened near 0 and 1 to discourage manipulation of extreme prices,
/// hard-capped as a fraction of the amount.
#[derive(Debug, Clone, Copy)]
pub struct StandardFeePolicy {
    pub rate: f64,
    pub cap_fraction: f64,
}

impl Default for StandardFeePolicy {
    fn default() -> Self {
        Self {
            rate: STANDARD_FEE_RATE,
            cap_fraction: MAX_FEE_FRACTION,
        }
    }
}

impl FeePolicy for StandardFeePolicy {
    fn taker_fee(&self, amount: f64, prob_before: f64, prob_after: f64) -> f64 {
        let displacement = (prob_after - prob_before).abs();
        if displacement == 0.0 {
            return 0.0;
        }
        // 1 / (q(1-q)) is 4 at the midpoint and grows toward the bounds;
        // normalize so a midpoint move pays exactly rate * displacement.
        let midpoint = 0.5 * (prob_before + prob_after);
        let steepness = 0.25 / (midpoint * (1.0 - midpoint));
        (amount * self.rate * displacement * steepness).min(amount * self.cap_fraction)
    }
}

/// Zero-fee policy, for subsidized markets and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFees;

impl FeePolicy for NoFees {
    fn taker_fee(&self, _amount: f64, _prob_before: f64, _prob_after: f64) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_move_no_fee() {
        let policy = StandardFeePolicy::default();
        assert_eq!(policy.taker_fee(100.0, 0.5, 0.5), 0.0);
    }

    #[test]
    fn larger_moves_cost_more() {
        let policy = StandardFeePolicy::default();
        let small = policy.taker_fee(100.0, 0.50, 0.52);
        let large = policy.taker_fee(100.0, 0.50, 0.60);
        assert!(large > small);
    }

    #[test]
    fn steeper_near_the_bounds() {
        let policy = StandardFeePolicy::default();
        let mid = policy.taker_fee(100.0, 0.50, 0.55);
        let edge = policy.taker_fee(100.0, 0.90, 0.95);
        assert!(edge > mid, "edge={edge} mid={mid}");
    }

    #[test]
    fn fee_never_exceeds_cap() {
        let policy = StandardFeePolicy::default();
        let fee = policy.taker_fee(100.0, 0.05, 0.95);
        assert!(fee <= 100.0 * policy.cap_fraction + 1e-12);
    }

    #[test]
    fn fee_never_exceeds_amount() {
        let policy = StandardFeePolicy::default();
        for (before, after) in [(0.01, 0.99), (0.5, 0.51), (0.98, 0.99)] {
            let fee = policy.taker_fee(10.0, before, after);
            assert!(fee < 10.0);
            assert!(fee >= 0.0);
        }
    }
}
