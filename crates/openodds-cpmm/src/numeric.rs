//! Epsilon-tolerant comparisons and the bounded bisection root finder.
//!
//! Every tolerance in the engine is [`EPSILON`] from the types crate; no
//! call site carries its own. The root finder is deliberately bisection
//! rather than Newton: the solves are over bracketed monotonic functions,
//! and bisection cannot step outside the bracket or diverge.

use openodds_types::constants::{EPSILON, MAX_BISECTION_ITERATIONS};
use openodds_types::{AmmPool, OpenoddsError, Result};

/// `a == b` within the shared epsilon.
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// `a >= b` within the shared epsilon.
#[must_use]
pub fn approx_gte(a: f64, b: f64) -> bool {
    a >= b - EPSILON
}

/// `a <= b` within the shared epsilon.
#[must_use]
pub fn approx_lte(a: f64, b: f64) -> bool {
    a <= b + EPSILON
}

/// Effectively-zero check for amounts and share counts.
#[must_use]
pub fn is_zero(a: f64) -> bool {
    a.abs() <= EPSILON
}

/// The constant-product invariant of a pool, computed once and passed
/// through a solve.
///
/// Callers own this value explicitly — repeated `powf` evaluations against
/// the same pool share it instead of recomputing or hiding a memo behind
/// global state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invariant {
    pub k: f64,
    pub p: f64,
}

impl Invariant {
    #[must_use]
    pub fn of(pool: &AmmPool) -> Self {
        Self {
            k: pool.invariant_k(),
            p: pool.p,
        }
    }

    /// Evaluate `yes^p * no^(1-p)` for candidate reserves.
    #[must_use]
    pub fn eval(&self, yes: f64, no: f64) -> f64 {
        yes.powf(self.p) * no.powf(1.0 - self.p)
    }

    /// Whether candidate reserves sit on this invariant curve.
    #[must_use]
    pub fn holds_for(&self, yes: f64, no: f64) -> bool {
        // Relative tolerance: k scales with pool size.
        (self.eval(yes, no) - self.k).abs() <= EPSILON.max(self.k * 1e-12)
    }
}

/// Find `x ∈ [lo, hi]` with `f(x) = 0` for monotonically decreasing `f`,
/// by bounded bisection.
///
/// Requires `f(lo) >= 0 >= f(hi)` (within epsilon); anything else means the
/// caller's bracket is wrong and is reported as an internal error rather
/// than silently returning an endpoint.
pub fn solve_decreasing<F: Fn(f64) -> f64>(mut lo: f64, mut hi: f64, f: F) -> Result<f64> {
    let f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo < -EPSILON || f_hi > EPSILON {
        return Err(OpenoddsError::Internal(format!(
            "bisection bracket does not straddle root: f({lo})={f_lo}, f({hi})={f_hi}"
        )));
    }

    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid.abs() <= EPSILON || (hi - lo) <= EPSILON {
            return Ok(mid);
        }
        if f_mid > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    // The interval halves every step, so 200 iterations reduce any finite
    // bracket below epsilon; reaching here means a NaN poisoned the solve.
    Err(OpenoddsError::Internal(
        "bisection failed to converge".into(),
    ))
}

/// Find `x ∈ [lo, hi]` with `f(x) = 0` for monotonically increasing `f`.
pub fn solve_increasing<F: Fn(f64) -> f64>(lo: f64, hi: f64, f: F) -> Result<f64> {
    solve_decreasing(lo, hi, |x| -f(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_comparisons() {
        assert!(approx_eq(1.0, 1.0 + EPSILON / 2.0));
        assert!(!approx_eq(1.0, 1.0 + 1e-6));
        assert!(approx_gte(1.0, 1.0 + EPSILON / 2.0));
        assert!(approx_lte(1.0, 1.0 - EPSILON / 2.0));
        assert!(is_zero(EPSILON / 2.0));
    }

    #[test]
    fn invariant_matches_pool() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let inv = Invariant::of(&pool);
        assert!(inv.holds_for(pool.yes_shares, pool.no_shares));
        assert!(!inv.holds_for(50.0, 100.0));
    }

    #[test]
    fn bisection_finds_sqrt() {
        // f(x) = 2 - x^2 is decreasing on [0, 2]; root at sqrt(2).
        let root = solve_decreasing(0.0, 2.0, |x| 2.0 - x * x).unwrap();
        assert!((root - 2.0_f64.sqrt()).abs() < 1e-8);
    }

    #[test]
    fn bisection_rejects_bad_bracket() {
        let result = solve_decreasing(0.0, 1.0, |x| x + 1.0);
        assert!(matches!(result, Err(OpenoddsError::Internal(_))));
    }

    #[test]
    fn increasing_solve() {
        let root = solve_increasing(0.0, 10.0, |x| x - 3.0).unwrap();
        assert!((root - 3.0).abs() < 1e-8);
    }
}
