//! Purchase and sale cost functions over the weighted constant-product
//! invariant.
//!
//! A purchase of `B` adds `B` to both reserves and returns shares `s` taken
//! from the bought side, chosen so the invariant is preserved:
//!
//! ```text
//! (bought + B - s)^p * (opp + B)^(1-p) = k        (bought = YES side)
//! ```
//!
//! A sale of `s` shares returns an amount `A` drawn from both reserves:
//!
//! ```text
//! (bought + s - A)^p * (opp - A)^(1-p) = k
//! ```
//!
//! Both use the closed form at `p = 0.5` and bounded bisection for general
//! weights; the two paths are cross-checked on reference vectors in tests.

use openodds_types::constants::{EPSILON, MIN_POOL_SHARES};
use openodds_types::{AmmPool, ContractKind, Fees, OpenoddsError, Outcome, Result, split_fee};
use serde::{Deserialize, Serialize};

use crate::fees::FeePolicy;
use crate::numeric::{Invariant, solve_decreasing, solve_increasing};

/// A purchase net of fees, ready for the caller to commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub shares: f64,
    pub new_pool: AmmPool,
    pub prob_before: f64,
    pub prob_after: f64,
    pub fees: Fees,
    /// Amount that actually entered the pool (`amount - fees.total()`).
    pub net_amount: f64,
}

fn check_amount(amount: f64) -> Result<()> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(OpenoddsError::InvalidAmount { amount });
    }
    Ok(())
}

/// Shares received for a net purchase amount, and the resulting pool.
///
/// `amount` is what enters the pool; fee handling lives in
/// [`purchase_with_fee`]. Errors with `InsufficientLiquidity` if the bought
/// reserve would end below the floor.
pub fn purchase(pool: &AmmPool, amount: f64, outcome: Outcome) -> Result<(f64, AmmPool)> {
    check_amount(amount)?;
    pool.validate()?;

    let bought = pool.reserve(outcome);
    let opp = pool.reserve(outcome.opposite());
    let inv = Invariant::of(pool);

    let shares = if (pool.p - 0.5).abs() <= EPSILON {
        shares_closed_form_half(bought, opp, amount)
    } else {
        shares_bisection(&inv, outcome, bought, opp, amount)?
    };

    let new_bought = bought + amount - shares;
    if new_bought < MIN_POOL_SHARES {
        return Err(OpenoddsError::InsufficientLiquidity {
            would_be: new_bought,
        });
    }

    let new_pool = pool
        .with_reserve(outcome, new_bought)
        .with_reserve(outcome.opposite(), opp + amount);
    Ok((shares, new_pool))
}

/// Closed form at `p = 0.5`: `(bought + B - s)(opp + B) = bought * opp`.
fn shares_closed_form_half(bought: f64, opp: f64, amount: f64) -> f64 {
    amount + bought - bought * opp / (opp + amount)
}

/// General weights: bisect on `s` against the invariant.
fn shares_bisection(
    inv: &Invariant,
    outcome: Outcome,
    bought: f64,
    opp: f64,
    amount: f64,
) -> Result<f64> {
    let eval = |s: f64| {
        let (yes, no) = match outcome {
            Outcome::Yes => (bought + amount - s, opp + amount),
            Outcome::No => (opp + amount, bought + amount - s),
        };
        inv.eval(yes, no) - inv.k
    };
    // s = 0 leaves the invariant above k; s approaching the full bought
    // reserve drives it toward zero.
    let hi = bought + amount - f64::MIN_POSITIVE.max(1e-12);
    solve_decreasing(0.0, hi, eval)
}

/// Amount returned for selling `shares`, and the resulting pool.
///
/// Exact inverse of [`purchase`]: selling the shares a purchase returned
/// restores the original pool.
pub fn sale(pool: &AmmPool, shares: f64, outcome: Outcome) -> Result<(f64, AmmPool)> {
    check_amount(shares)?;
    pool.validate()?;

    let bought = pool.reserve(outcome);
    let opp = pool.reserve(outcome.opposite());
    let inv = Invariant::of(pool);

    // Both reserves shrink by A; keep each above the floor.
    let upper = (opp - MIN_POOL_SHARES).min(bought + shares - MIN_POOL_SHARES);
    if upper <= 0.0 {
        return Err(OpenoddsError::InsufficientLiquidity { would_be: opp });
    }

    let amount = if (pool.p - 0.5).abs() <= EPSILON {
        sale_closed_form_half(bought, opp, shares)
    } else {
        let eval = |a: f64| {
            let (yes, no) = match outcome {
                Outcome::Yes => (bought + shares - a, opp - a),
                Outcome::No => (opp - a, bought + shares - a),
            };
            inv.eval(yes, no) - inv.k
        };
        if eval(upper) > EPSILON {
            return Err(OpenoddsError::InsufficientLiquidity { would_be: opp - upper });
        }
        solve_decreasing(0.0, upper, eval)?
    };

    if amount > upper + EPSILON {
        return Err(OpenoddsError::InsufficientLiquidity {
            would_be: opp - amount,
        });
    }

    let new_pool = pool
        .with_reserve(outcome, bought + shares - amount)
        .with_reserve(outcome.opposite(), opp - amount);
    new_pool.validate()?;
    Ok((amount, new_pool))
}

/// Closed form at `p = 0.5`: the smaller root of
/// `A^2 - (bought + s + opp) A + s * opp = 0`.
fn sale_closed_form_half(bought: f64, opp: f64, shares: f64) -> f64 {
    let b = bought + shares + opp;
    let disc = (b * b - 4.0 * shares * opp).max(0.0);
    0.5 * (b - disc.sqrt())
}

/// The net amount that moves the pool's probability exactly to `target`.
///
/// Closed form: at probability `q` the reserves must satisfy
/// `bought' = c * opp'` with `c` fixed by `q`, and the invariant pins the
/// scale. Returns zero when the pool is already at or past the target.
pub fn amount_to_reach_prob(pool: &AmmPool, target: f64, outcome: Outcome) -> Result<f64> {
    if !target.is_finite() || target <= 0.0 || target >= 1.0 {
        return Err(OpenoddsError::ProbabilityOutOfBounds { prob: target });
    }
    let prob = pool.probability();
    let crossed = match outcome {
        Outcome::Yes => target <= prob,
        Outcome::No => target >= prob,
    };
    if crossed {
        return Ok(0.0);
    }

    let inv = Invariant::of(pool);
    let p = pool.p;
    // c = yes'/no' at probability `target`.
    let c = p * (1.0 - target) / ((1.0 - p) * target);
    let amount = match outcome {
        // Buying YES grows the NO reserve: no' = k / c^p.
        Outcome::Yes => inv.k / c.powf(p) - pool.no_shares,
        // Buying NO grows the YES reserve: yes' = k * c^(1-p).
        Outcome::No => inv.k * c.powf(1.0 - p) - pool.yes_shares,
    };
    Ok(amount.max(0.0))
}

/// The net amount that buys exactly `shares` of `outcome`.
///
/// Inverse of [`purchase`] in the share argument: feeding the returned
/// amount back through `purchase` yields `shares`. Closed form at
/// `p = 0.5` (the share equation is quadratic in the amount), bounded
/// bisection for general weights.
pub fn amount_for_shares(pool: &AmmPool, shares: f64, outcome: Outcome) -> Result<f64> {
    check_amount(shares)?;
    pool.validate()?;

    let bought = pool.reserve(outcome);
    let opp = pool.reserve(outcome.opposite());

    let amount = if (pool.p - 0.5).abs() <= EPSILON {
        // (bought + B - s)(opp + B) = bought * opp, positive root in B.
        let b = bought + opp - shares;
        0.5 * ((b * b + 4.0 * shares * opp).sqrt() - b)
    } else {
        let inv = Invariant::of(pool);
        let eval = |a: f64| {
            let (yes, no) = match outcome {
                Outcome::Yes => (bought + a - shares, opp + a),
                Outcome::No => (opp + a, bought + a - shares),
            };
            inv.eval(yes, no) - inv.k
        };
        // The bought reserve must stay positive over the bracket; each
        // share costs strictly less than one unit, so the root sits
        // below `shares`.
        let lo = (shares - bought + 1e-12).max(0.0);
        solve_increasing(lo, shares, eval)?
    };

    let new_bought = bought + amount - shares;
    if new_bought < MIN_POOL_SHARES {
        return Err(OpenoddsError::InsufficientLiquidity {
            would_be: new_bought,
        });
    }
    Ok(amount)
}

/// Full purchase flow: fee off the top, remainder into the pool.
///
/// The fee is quoted against the probability displacement of a
/// full-amount purchase, then deducted before the real solve. Both steps
/// are deterministic, so quoting and committing never disagree.
pub fn purchase_with_fee(
    pool: &AmmPool,
    kind: &ContractKind,
    policy: &dyn FeePolicy,
    amount: f64,
    outcome: Outcome,
) -> Result<Purchase> {
    check_amount(amount)?;
    let prob_before = pool.probability();

    let (_, probe_pool) = purchase(pool, amount, outcome)?;
    let fee_total = policy.taker_fee(amount, prob_before, probe_pool.probability());
    let fees = split_fee(fee_total, kind);

    let net_amount = amount - fee_total;
    let (shares, new_pool) = purchase(pool, net_amount, outcome)?;
    Ok(Purchase {
        shares,
        prob_before,
        prob_after: new_pool.probability(),
        new_pool,
        fees,
        net_amount,
    })
}

#[cfg(test)]
mod tests {
    use openodds_types::constants::MAX_CPMM_PROB;

    use super::*;
    use crate::fees::{NoFees, StandardFeePolicy};

    fn binary_kind(pool: AmmPool) -> ContractKind {
        ContractKind::Binary { pool }
    }

    #[test]
    fn purchase_moves_probability_toward_outcome() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let (shares, new_pool) = purchase(&pool, 50.0, Outcome::Yes).unwrap();
        assert!(shares > 50.0, "YES shares cost < 1 at prob 0.5, got {shares}");
        assert!(new_pool.probability() > 0.5);
        assert!(new_pool.probability() < 1.0);
    }

    #[test]
    fn purchase_preserves_invariant() {
        let pool = AmmPool::dummy(120.0, 80.0, 0.5);
        let inv = Invariant::of(&pool);
        let (_, new_pool) = purchase(&pool, 33.0, Outcome::No).unwrap();
        assert!(inv.holds_for(new_pool.yes_shares, new_pool.no_shares));
    }

    #[test]
    fn purchase_preserves_invariant_general_weight() {
        let pool = AmmPool::dummy(150.0, 90.0, 0.33);
        let inv = Invariant::of(&pool);
        let (_, new_pool) = purchase(&pool, 41.0, Outcome::Yes).unwrap();
        assert!(
            inv.holds_for(new_pool.yes_shares, new_pool.no_shares),
            "k drifted: {} -> {}",
            inv.k,
            new_pool.invariant_k()
        );
    }

    #[test]
    fn closed_form_and_bisection_agree_on_reference_vectors() {
        // Same pools solved both ways at p = 0.5.
        let vectors: [(f64, f64, f64); 5] = [
            (100.0, 100.0, 10.0),
            (100.0, 100.0, 50.0),
            (250.0, 40.0, 17.5),
            (12.0, 900.0, 3.0),
            (1e5, 1e5, 1234.0),
        ];
        for (yes, no, amount) in vectors {
            let inv = Invariant {
                k: yes.sqrt() * no.sqrt(),
                p: 0.5,
            };
            let closed = shares_closed_form_half(yes, no, amount);
            let solved = shares_bisection(&inv, Outcome::Yes, yes, no, amount).unwrap();
            assert!(
                (closed - solved).abs() < 1e-6,
                "closed={closed} solved={solved} for ({yes},{no},{amount})"
            );
        }
    }

    #[test]
    fn sale_inverts_purchase() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let (shares, after_buy) = purchase(&pool, 50.0, Outcome::Yes).unwrap();
        let (amount, after_sale) = sale(&after_buy, shares, Outcome::Yes).unwrap();
        assert!((amount - 50.0).abs() < 1e-6, "got back {amount}");
        assert!((after_sale.probability() - 0.5).abs() < 1e-9);
        assert!((after_sale.yes_shares - 100.0).abs() < 1e-6);
        assert!((after_sale.no_shares - 100.0).abs() < 1e-6);
    }

    #[test]
    fn sale_inverts_purchase_general_weight() {
        let pool = AmmPool::dummy(80.0, 200.0, 0.7);
        let prob = pool.probability();
        let (shares, after_buy) = purchase(&pool, 25.0, Outcome::No).unwrap();
        let (amount, after_sale) = sale(&after_buy, shares, Outcome::No).unwrap();
        assert!((amount - 25.0).abs() < 1e-6);
        assert!((after_sale.probability() - prob).abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_amounts() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                purchase(&pool, bad, Outcome::Yes),
                Err(OpenoddsError::InvalidAmount { .. })
            ));
            assert!(matches!(
                sale(&pool, bad, Outcome::Yes),
                Err(OpenoddsError::InvalidAmount { .. })
            ));
        }
    }

    #[test]
    fn oversized_sale_breaches_floor() {
        let pool = AmmPool::dummy(10.0, 10.0, 0.5);
        // Selling far more shares than the pool can absorb.
        let result = sale(&pool, 1e9, Outcome::Yes);
        assert!(matches!(
            result,
            Err(OpenoddsError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn amount_to_reach_prob_hits_target() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let amount = amount_to_reach_prob(&pool, 0.6, Outcome::Yes).unwrap();
        assert!(amount > 0.0);
        let (_, new_pool) = purchase(&pool, amount, Outcome::Yes).unwrap();
        assert!((new_pool.probability() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn amount_to_reach_prob_general_weight() {
        let pool = AmmPool::dummy(140.0, 60.0, 0.35);
        let target = (pool.probability() - 0.1).max(0.05);
        let amount = amount_to_reach_prob(&pool, target, Outcome::No).unwrap();
        let (_, new_pool) = purchase(&pool, amount, Outcome::No).unwrap();
        assert!((new_pool.probability() - target).abs() < 1e-9);
    }

    #[test]
    fn amount_to_reach_prob_zero_when_past_target() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        assert_eq!(
            amount_to_reach_prob(&pool, 0.4, Outcome::Yes).unwrap(),
            0.0
        );
        assert_eq!(amount_to_reach_prob(&pool, 0.6, Outcome::No).unwrap(), 0.0);
    }

    #[test]
    fn amount_for_shares_inverts_purchase() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let (shares, _) = purchase(&pool, 37.0, Outcome::Yes).unwrap();
        let amount = amount_for_shares(&pool, shares, Outcome::Yes).unwrap();
        assert!((amount - 37.0).abs() < 1e-9, "got {amount}");
    }

    #[test]
    fn amount_for_shares_general_weight() {
        let pool = AmmPool::dummy(140.0, 60.0, 0.35);
        let amount = amount_for_shares(&pool, 25.0, Outcome::No).unwrap();
        let (shares, _) = purchase(&pool, amount, Outcome::No).unwrap();
        assert!((shares - 25.0).abs() < 1e-6, "got {shares} for {amount}");
    }

    #[test]
    fn amount_for_shares_rejects_bad_input() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        for bad in [0.0, -3.0, f64::NAN] {
            assert!(matches!(
                amount_for_shares(&pool, bad, Outcome::Yes),
                Err(OpenoddsError::InvalidAmount { .. })
            ));
        }
        // A share count that would drain the bought reserve past the floor.
        assert!(matches!(
            amount_for_shares(&pool, 1e9, Outcome::Yes),
            Err(OpenoddsError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn purchase_with_fee_charges_and_preserves_invariant() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let kind = binary_kind(pool);
        let policy = StandardFeePolicy::default();
        let result = purchase_with_fee(&pool, &kind, &policy, 50.0, Outcome::Yes).unwrap();

        assert!(result.fees.total() > 0.0);
        assert!(result.net_amount < 50.0);
        assert!(result.prob_after > result.prob_before);
        let inv = Invariant::of(&pool);
        assert!(inv.holds_for(result.new_pool.yes_shares, result.new_pool.no_shares));
    }

    #[test]
    fn round_trip_never_manufactures_value() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let kind = binary_kind(pool);
        let policy = StandardFeePolicy::default();

        let buy = purchase_with_fee(&pool, &kind, &policy, 50.0, Outcome::Yes).unwrap();
        let (gross, after_sale) = sale(&buy.new_pool, buy.shares, Outcome::Yes).unwrap();
        let sale_fee = policy.taker_fee(gross, buy.new_pool.probability(), after_sale.probability());
        let returned = gross - sale_fee;

        assert!(returned < 50.0, "round trip returned {returned}");
        assert!((after_sale.probability() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn fee_free_policy_keeps_full_amount_in_pool() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let kind = binary_kind(pool);
        let result = purchase_with_fee(&pool, &kind, &NoFees, 50.0, Outcome::Yes).unwrap();
        assert_eq!(result.fees.total(), 0.0);
        assert!((result.net_amount - 50.0).abs() < 1e-12);
    }

    #[test]
    fn randomized_buy_then_sell_round_trips() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let pool = AmmPool::dummy(
                rng.gen_range(10.0..500.0),
                rng.gen_range(10.0..500.0),
                rng.gen_range(0.1..0.9),
            );
            let amount = rng.gen_range(0.5..100.0);
            let outcome = if rng.gen_bool(0.5) {
                Outcome::Yes
            } else {
                Outcome::No
            };

            let inv = Invariant::of(&pool);
            let (shares, after_buy) = purchase(&pool, amount, outcome).unwrap();
            assert!(shares > 0.0, "no shares for {pool:?} amount={amount}");
            let drift = (after_buy.invariant_k() - inv.k).abs() / inv.k;
            assert!(drift < 1e-6, "k drifted by {drift} for {pool:?}");

            let (returned, restored) = sale(&after_buy, shares, outcome).unwrap();
            assert!(
                (returned - amount).abs() < 1e-6 * amount.max(1.0),
                "round trip returned {returned} for {amount}"
            );
            assert!((restored.probability() - pool.probability()).abs() < 1e-6);
        }
    }

    #[test]
    fn probability_stays_below_one_under_extreme_buying() {
        let mut pool = AmmPool::dummy(100.0, 100.0, 0.5);
        for _ in 0..20 {
            let (_, next) = purchase(&pool, 1000.0, Outcome::Yes).unwrap();
            pool = next;
        }
        let prob = pool.probability();
        assert!(prob > MAX_CPMM_PROB && prob < 1.0, "prob={prob}");
    }
}
