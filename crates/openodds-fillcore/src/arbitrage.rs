//! Cross-answer arbitrage for sum-to-one multiple-choice contracts.
//!
//! A purchase on one answer moves its probability and leaves the contract's
//! probabilities summing away from one. Restoring the invariant is itself a
//! trade, not a reprice: the solver buys the opposite side of every other
//! answer and redeems the resulting share baskets against the target, so
//! each price move is financed by real cash and share flows. One NO share
//! on each of the other `K - 1` answers redeems to `K - 2` in cash plus one
//! YES share on the target; one YES share on each other answer redeems to
//! one NO share on the target. Reserve value plus outstanding share claims
//! is therefore unchanged under every resolution.
//!
//! The basket size is found by bounded bisection with an explicit
//! convergence check; exhausting the cap, or a probability bound that
//! leaves residual outstanding, is a reported failure rather than a silent
//! best-effort result.

use openodds_cpmm::fees::FeePolicy;
use openodds_cpmm::pricing::{
    Purchase, amount_for_shares, amount_to_reach_prob, purchase, purchase_with_fee,
};
use openodds_types::constants::{
    EPSILON, MAX_ARBITRAGE_ITERATIONS, MAX_CPMM_PROB, MIN_CPMM_PROB, SUM_TO_ONE_TOLERANCE,
};
use openodds_types::{AmmPool, ContractKind, OpenoddsError, Outcome, Result};

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveStatus {
    /// Probabilities sum to one within tolerance.
    Converged { iterations: usize },
    /// Iteration cap or a probability bound hit with `residual` still
    /// outstanding.
    NotConverged { residual: f64 },
}

impl SolveStatus {
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// A purchase on one answer of a sum-to-one contract, with the cross-answer
/// adjustment that restores the invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerPurchase {
    /// The direct fill on the target answer's pool.
    pub purchase: Purchase,
    /// Target-side shares redeemed out of the cross-answer baskets.
    pub extra_shares: f64,
    /// Net cash routed through the other answers' pools (basket cost minus
    /// the cash leg of the redemption).
    pub arbitrage_amount: f64,
    /// All answer pools after the solve, target included.
    pub pools: Vec<AmmPool>,
    /// Solver iterations spent finding the basket size.
    pub iterations: usize,
}

impl AnswerPurchase {
    /// Total target-side shares the buyer receives.
    #[must_use]
    pub fn total_shares(&self) -> f64 {
        self.purchase.shares + self.extra_shares
    }
}

/// Verify the contract's probabilities sum to one within tolerance.
///
/// Called on entry to any operation that relies on the invariant already
/// holding; a violation here means stored state was corrupted upstream.
pub fn check_sum_to_one(pools: &[AmmPool]) -> Result<()> {
    let sum: f64 = pools.iter().map(AmmPool::probability).sum();
    if (sum - 1.0).abs() > SUM_TO_ONE_TOLERANCE {
        return Err(OpenoddsError::InconsistentState {
            reason: format!("answer probabilities sum to {sum:.6}, expected 1"),
        });
    }
    Ok(())
}

/// A fully-priced candidate at one basket size.
struct Candidate {
    pools: Vec<AmmPool>,
    purchase: Purchase,
    basket: f64,
    arbitrage_amount: f64,
    sum: f64,
}

/// Price the whole operation at basket size `n`: buy `n` opposite-side
/// shares on every other answer, redeem the baskets, and put the remainder
/// of `amount` through the target pool. `None` when the basket legs
/// consume the whole amount.
#[allow(clippy::cast_precision_loss)]
fn price_at_basket(
    pools: &[AmmPool],
    kind: &ContractKind,
    policy: &dyn FeePolicy,
    target: usize,
    amount: f64,
    outcome: Outcome,
    n: f64,
) -> Result<Option<Candidate>> {
    let opposite = outcome.opposite();
    let mut new_pools = pools.to_vec();
    let mut basket_cost = 0.0;
    if n > EPSILON {
        for (idx, pool) in pools.iter().enumerate() {
            if idx == target {
                continue;
            }
            let cost = amount_for_shares(pool, n, opposite)?;
            let (_, after) = purchase(pool, cost, opposite)?;
            new_pools[idx] = after;
            basket_cost += cost;
        }
    }
    // A NO basket redeems to n(K - 2) in cash alongside the n target YES
    // shares; a YES basket redeems share-for-share with no cash leg.
    let redeemed_cash = match outcome {
        Outcome::Yes => n * (pools.len() as f64 - 2.0),
        Outcome::No => 0.0,
    };
    let direct = amount - basket_cost + redeemed_cash;
    if direct <= EPSILON {
        return Ok(None);
    }
    let purchase = purchase_with_fee(&pools[target], kind, policy, direct, outcome)?;
    new_pools[target] = purchase.new_pool;
    let sum = new_pools.iter().map(AmmPool::probability).sum();
    Ok(Some(Candidate {
        pools: new_pools,
        purchase,
        basket: n,
        arbitrage_amount: basket_cost - redeemed_cash,
        sum,
    }))
}

/// Largest basket the other answers can absorb before one of them is
/// pushed to its probability bound.
fn max_basket(pools: &[AmmPool], target: usize, opposite: Outcome) -> Result<f64> {
    let bound = match opposite {
        Outcome::Yes => MAX_CPMM_PROB,
        Outcome::No => MIN_CPMM_PROB,
    };
    let mut n_max = f64::MAX;
    for (idx, pool) in pools.iter().enumerate() {
        if idx == target {
            continue;
        }
        let cash = amount_to_reach_prob(pool, bound, opposite)?;
        if cash <= EPSILON {
            return Ok(0.0);
        }
        let (shares, _) = purchase(pool, cash, opposite)?;
        n_max = n_max.min(shares);
    }
    Ok(n_max)
}

/// Bisect the basket size until the probabilities sum to one.
fn solve_basket(
    pools: &[AmmPool],
    kind: &ContractKind,
    policy: &dyn FeePolicy,
    target: usize,
    amount: f64,
    outcome: Outcome,
) -> Result<(Candidate, SolveStatus)> {
    // Buying the target side pushes the sum past one (YES) or under it
    // (NO); a larger basket pulls it back. Signing the residual lets both
    // directions bisect identically.
    let signed = |sum: f64| match outcome {
        Outcome::Yes => sum - 1.0,
        Outcome::No => 1.0 - sum,
    };

    let first = price_at_basket(pools, kind, policy, target, amount, outcome, 0.0)?
        .ok_or(OpenoddsError::InvalidAmount { amount })?;
    if signed(first.sum).abs() <= SUM_TO_ONE_TOLERANCE {
        return Ok((first, SolveStatus::Converged { iterations: 0 }));
    }

    let mut lo = 0.0;
    let mut hi = max_basket(pools, target, outcome.opposite())?;
    let mut best = first;
    if hi <= EPSILON {
        // The other answers are already pinned at their bounds.
        let residual = signed(best.sum);
        return Ok((best, SolveStatus::NotConverged { residual }));
    }

    for iteration in 1..=MAX_ARBITRAGE_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        match price_at_basket(pools, kind, policy, target, amount, outcome, mid)? {
            Some(candidate) => {
                let residual = signed(candidate.sum);
                if residual.abs() <= SUM_TO_ONE_TOLERANCE {
                    return Ok((
                        candidate,
                        SolveStatus::Converged {
                            iterations: iteration,
                        },
                    ));
                }
                if residual > 0.0 {
                    lo = mid;
                    best = candidate;
                } else {
                    hi = mid;
                }
            }
            // The basket consumed the whole amount: past the root.
            None => hi = mid,
        }
    }
    let residual = signed(best.sum);
    Ok((best, SolveStatus::NotConverged { residual }))
}

/// Buy one side of one answer of a sum-to-one contract.
///
/// Entry requires the invariant to already hold; the purchase then breaks
/// it deliberately and the basket legs restore it. A solve that cannot
/// converge fails the whole operation; no partial result escapes.
pub fn buy_answer(
    pools: &[AmmPool],
    kind: &ContractKind,
    policy: &dyn FeePolicy,
    target: usize,
    amount: f64,
    outcome: Outcome,
) -> Result<AnswerPurchase> {
    if pools.len() < 2 {
        return Err(OpenoddsError::InvalidRequest {
            reason: "sum-to-one solve needs at least two answers".into(),
        });
    }
    if target >= pools.len() {
        return Err(OpenoddsError::InvalidRequest {
            reason: format!(
                "answer index {target} out of range ({} answers)",
                pools.len()
            ),
        });
    }
    check_sum_to_one(pools)?;
    for pool in pools {
        pool.validate()?;
    }

    let (candidate, status) = solve_basket(pools, kind, policy, target, amount, outcome)?;
    match status {
        SolveStatus::Converged { iterations } => {
            tracing::debug!(
                iterations,
                basket = candidate.basket,
                "sum-to-one solve converged"
            );
            Ok(AnswerPurchase {
                purchase: candidate.purchase,
                extra_shares: candidate.basket,
                arbitrage_amount: candidate.arbitrage_amount,
                pools: candidate.pools,
                iterations,
            })
        }
        SolveStatus::NotConverged { residual } => {
            tracing::warn!(residual, "sum-to-one solve failed to converge");
            Err(OpenoddsError::ArbitrageSolveFailed {
                iterations: MAX_ARBITRAGE_ITERATIONS,
                residual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use openodds_cpmm::fees::NoFees;

    use super::*;

    /// Three pools quoting probabilities 0.5, 0.3, 0.2.
    fn three_answers() -> Vec<AmmPool> {
        vec![
            AmmPool::dummy(100.0, 100.0, 0.5),
            AmmPool::dummy(152.75, 65.465, 0.5),
            AmmPool::dummy(200.0, 50.0, 0.5),
        ]
    }

    fn binary_kind(pool: AmmPool) -> ContractKind {
        ContractKind::Binary { pool }
    }

    /// Total reserve value when `winner` resolves YES and every other
    /// answer resolves NO.
    fn winner_value(pools: &[AmmPool], winner: usize) -> f64 {
        pools
            .iter()
            .enumerate()
            .map(|(idx, pool)| {
                if idx == winner {
                    pool.yes_shares
                } else {
                    pool.no_shares
                }
            })
            .sum()
    }

    #[test]
    fn entry_check_accepts_consistent_and_rejects_drifted() {
        let pools = three_answers();
        let sum: f64 = pools.iter().map(AmmPool::probability).sum();
        assert!((sum - 1.0).abs() < SUM_TO_ONE_TOLERANCE, "fixture drifted: {sum}");
        assert!(check_sum_to_one(&pools).is_ok());

        let mut drifted = pools;
        // Swap in a pool quoting 0.6 where 0.5 kept the sum at one.
        drifted[0] = AmmPool::dummy(100.0, 150.0, 0.5);
        assert!(matches!(
            check_sum_to_one(&drifted),
            Err(OpenoddsError::InconsistentState { .. })
        ));
    }

    #[test]
    fn buy_answer_moves_target_up_and_others_down() {
        let pools = three_answers();
        let kind = binary_kind(pools[0]);
        let before: Vec<f64> = pools.iter().map(AmmPool::probability).collect();

        let result = buy_answer(&pools, &kind, &NoFees, 0, 40.0, Outcome::Yes).unwrap();

        assert!(result.pools[0].probability() > before[0]);
        assert!(result.pools[1].probability() < before[1]);
        assert!(result.pools[2].probability() < before[2]);
        let sum: f64 = result.pools.iter().map(AmmPool::probability).sum();
        assert!((sum - 1.0).abs() <= SUM_TO_ONE_TOLERANCE);
        assert!(result.purchase.shares > 0.0);
        assert!(result.extra_shares > 0.0);
    }

    #[test]
    fn buy_no_moves_target_down_and_others_up() {
        let pools = three_answers();
        let kind = binary_kind(pools[0]);
        let before: Vec<f64> = pools.iter().map(AmmPool::probability).collect();

        let result = buy_answer(&pools, &kind, &NoFees, 1, 20.0, Outcome::No).unwrap();

        assert!(result.pools[1].probability() < before[1]);
        assert!(result.pools[0].probability() > before[0]);
        assert!(result.pools[2].probability() > before[2]);
        let sum: f64 = result.pools.iter().map(AmmPool::probability).sum();
        assert!((sum - 1.0).abs() <= SUM_TO_ONE_TOLERANCE);
    }

    #[test]
    fn basket_legs_buy_equal_shares() {
        let pools = three_answers();
        let kind = binary_kind(pools[0]);
        let result = buy_answer(&pools, &kind, &NoFees, 0, 40.0, Outcome::Yes).unwrap();

        // Each other pool absorbed one leg: cash on both reserves, the
        // basket's share count off the sold side.
        for idx in [1, 2] {
            let cash = result.pools[idx].yes_shares - pools[idx].yes_shares;
            let sold = cash - (result.pools[idx].no_shares - pools[idx].no_shares);
            assert!(cash > 0.0, "leg {idx} moved no cash");
            assert!(
                (sold - result.extra_shares).abs() < 1e-6,
                "leg {idx} sold {sold}, basket {}",
                result.extra_shares
            );
        }
    }

    #[test]
    fn yes_purchase_conserves_value_for_every_winner() {
        let pools = three_answers();
        let kind = binary_kind(pools[0]);
        let amount = 60.0;
        let result = buy_answer(&pools, &kind, &NoFees, 0, amount, Outcome::Yes).unwrap();

        // Whoever resolves YES, the reserves gained plus the buyer's claim
        // equal exactly what the buyer paid in.
        for winner in 0..3 {
            let gained = winner_value(&result.pools, winner) - winner_value(&pools, winner);
            let claim = if winner == 0 { result.total_shares() } else { 0.0 };
            assert!(
                (gained + claim - amount).abs() < 1e-6,
                "winner {winner}: reserves gained {gained}, claim {claim}"
            );
        }
    }

    #[test]
    fn no_purchase_conserves_value_for_every_winner() {
        let pools = three_answers();
        let kind = binary_kind(pools[0]);
        let amount = 25.0;
        let result = buy_answer(&pools, &kind, &NoFees, 1, amount, Outcome::No).unwrap();

        for winner in 0..3 {
            let gained = winner_value(&result.pools, winner) - winner_value(&pools, winner);
            let claim = if winner == 1 { 0.0 } else { result.total_shares() };
            assert!(
                (gained + claim - amount).abs() < 1e-6,
                "winner {winner}: reserves gained {gained}, claim {claim}"
            );
        }
    }

    #[test]
    fn two_answer_contract_has_no_cash_leg() {
        let pools = vec![
            AmmPool::dummy(100.0, 100.0, 0.5),
            AmmPool::dummy(100.0, 100.0, 0.5),
        ];
        let kind = binary_kind(pools[0]);
        let amount = 30.0;
        let result = buy_answer(&pools, &kind, &NoFees, 0, amount, Outcome::Yes).unwrap();

        let sum: f64 = result.pools.iter().map(AmmPool::probability).sum();
        assert!((sum - 1.0).abs() <= SUM_TO_ONE_TOLERANCE);
        for winner in 0..2 {
            let gained = winner_value(&result.pools, winner) - winner_value(&pools, winner);
            let claim = if winner == 0 { result.total_shares() } else { 0.0 };
            assert!((gained + claim - amount).abs() < 1e-6, "winner {winner}");
        }
    }

    #[test]
    fn bound_saturated_answers_fail_the_solve() {
        // The free answers already quote the probability floor, so no
        // basket can absorb the target's move.
        let pools = vec![
            AmmPool::dummy(100.0 / 0.98 - 100.0, 100.0, 0.5),
            AmmPool::dummy(9900.0, 100.0, 0.5),
            AmmPool::dummy(9900.0, 100.0, 0.5),
        ];
        let sum: f64 = pools.iter().map(AmmPool::probability).sum();
        assert!((sum - 1.0).abs() < SUM_TO_ONE_TOLERANCE, "fixture drifted: {sum}");
        let kind = binary_kind(pools[0]);

        assert!(matches!(
            buy_answer(&pools, &kind, &NoFees, 0, 50.0, Outcome::Yes),
            Err(OpenoddsError::ArbitrageSolveFailed { .. })
        ));
    }

    #[test]
    fn buy_answer_rejects_inconsistent_entry_state() {
        let mut pools = three_answers();
        pools[2] = AmmPool::dummy(60.0, 40.0, 0.5);
        let kind = binary_kind(pools[0]);

        assert!(matches!(
            buy_answer(&pools, &kind, &NoFees, 0, 10.0, Outcome::Yes),
            Err(OpenoddsError::InconsistentState { .. })
        ));
    }

    #[test]
    fn buy_answer_rejects_bad_index() {
        let pools = three_answers();
        let kind = binary_kind(pools[0]);
        assert!(matches!(
            buy_answer(&pools, &kind, &NoFees, 7, 10.0, Outcome::Yes),
            Err(OpenoddsError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn solve_is_deterministic() {
        let pools = three_answers();
        let kind = binary_kind(pools[0]);
        let a = buy_answer(&pools, &kind, &NoFees, 0, 40.0, Outcome::Yes).unwrap();
        let b = buy_answer(&pools, &kind, &NoFees, 0, 40.0, Outcome::Yes).unwrap();
        assert_eq!(a, b);
    }
}
