//! The sale engine: redemption of matched pairs first, pool sale second.
//!
//! A user who holds both YES and NO shares (acquired through resting-order
//! matches rather than pool trades) redeems the matched pairs at a fixed
//! 1:1 rate without touching the pool. Pairs carry no price risk, so that
//! path is checked first and is fee-free by construction; only the excess
//! goes through the general invariant sale.

use openodds_types::{
    AmmPool, ContractKind, Fees, OpenoddsError, Outcome, Result, SharePosition, split_fee,
};
use serde::{Deserialize, Serialize};

use crate::fees::FeePolicy;
use crate::numeric::is_zero;
use crate::pricing::sale;

/// Outcome of a share sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Total currency returned to the seller, net of fees.
    pub amount_returned: f64,
    /// Portion of `shares` redeemed 1:1 against the opposite side.
    pub pairs_redeemed: f64,
    /// Portion sold into the pool.
    pub shares_sold: f64,
    pub new_pool: AmmPool,
    pub prob_before: f64,
    pub prob_after: f64,
    pub fees: Fees,
}

/// Sell `shares` of `outcome` out of `position`.
///
/// The position must actually hold the shares; redemption consumes the
/// matched pairs first, the pool sale covers the remainder at a reduced
/// fee quoted by `policy`.
pub fn sell_shares(
    position: &SharePosition,
    pool: &AmmPool,
    kind: &ContractKind,
    policy: &dyn FeePolicy,
    shares: f64,
    outcome: Outcome,
) -> Result<Sale> {
    if !(shares.is_finite() && shares > 0.0) {
        return Err(OpenoddsError::InvalidAmount { amount: shares });
    }
    let held = position.shares(outcome);
    if shares > held {
        return Err(OpenoddsError::InsufficientShares {
            needed: shares,
            held,
        });
    }

    let prob_before = pool.probability();
    let pairs = position.redeemable_pairs().min(shares);
    let remainder = shares - pairs;

    if is_zero(remainder) {
        // Fully covered by redemption: one unit per pair, pool untouched.
        return Ok(Sale {
            amount_returned: pairs,
            pairs_redeemed: pairs,
            shares_sold: 0.0,
            new_pool: *pool,
            prob_before,
            prob_after: prob_before,
            fees: Fees::ZERO,
        });
    }

    let (gross, new_pool) = sale(pool, remainder, outcome)?;
    let prob_after = new_pool.probability();
    let fee_total = policy.taker_fee(gross, prob_before, prob_after);
    let fees = split_fee(fee_total, kind);

    Ok(Sale {
        amount_returned: pairs + gross - fee_total,
        pairs_redeemed: pairs,
        shares_sold: remainder,
        new_pool,
        prob_before,
        prob_after,
        fees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::{NoFees, StandardFeePolicy};
    use crate::pricing::purchase;

    fn binary_kind(pool: AmmPool) -> ContractKind {
        ContractKind::Binary { pool }
    }

    #[test]
    fn matched_pairs_redeem_without_touching_pool() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let position = SharePosition {
            yes_shares: 30.0,
            no_shares: 30.0,
        };
        let sale = sell_shares(
            &position,
            &pool,
            &binary_kind(pool),
            &StandardFeePolicy::default(),
            30.0,
            Outcome::Yes,
        )
        .unwrap();

        assert!((sale.amount_returned - 30.0).abs() < 1e-12);
        assert_eq!(sale.pairs_redeemed, 30.0);
        assert_eq!(sale.shares_sold, 0.0);
        assert_eq!(sale.fees, Fees::ZERO);
        assert_eq!(sale.new_pool, pool);
    }

    #[test]
    fn redemption_precedes_pool_sale() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let position = SharePosition {
            yes_shares: 50.0,
            no_shares: 20.0,
        };
        let sale = sell_shares(
            &position,
            &pool,
            &binary_kind(pool),
            &NoFees,
            50.0,
            Outcome::Yes,
        )
        .unwrap();

        assert!((sale.pairs_redeemed - 20.0).abs() < 1e-12);
        assert!((sale.shares_sold - 30.0).abs() < 1e-12);
        // Selling YES into the pool drops the probability.
        assert!(sale.prob_after < sale.prob_before);
        // 20 risk-free units plus the pool proceeds for 30 YES shares.
        assert!(sale.amount_returned > 20.0);
        assert!(sale.amount_returned < 50.0);
    }

    #[test]
    fn pool_only_sale_inverts_purchase() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let (shares, after_buy) = purchase(&pool, 50.0, Outcome::Yes).unwrap();
        let position = SharePosition {
            yes_shares: shares,
            no_shares: 0.0,
        };
        let sale = sell_shares(
            &position,
            &after_buy,
            &binary_kind(after_buy),
            &NoFees,
            shares,
            Outcome::Yes,
        )
        .unwrap();
        assert!((sale.amount_returned - 50.0).abs() < 1e-6);
        assert!((sale.new_pool.probability() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn selling_more_than_held_rejected() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let position = SharePosition {
            yes_shares: 5.0,
            no_shares: 0.0,
        };
        let result = sell_shares(
            &position,
            &pool,
            &binary_kind(pool),
            &NoFees,
            10.0,
            Outcome::Yes,
        );
        assert!(matches!(
            result,
            Err(OpenoddsError::InsufficientShares { .. })
        ));
    }

    #[test]
    fn invalid_share_count_rejected() {
        let pool = AmmPool::dummy(100.0, 100.0, 0.5);
        let position = SharePosition::default();
        for bad in [0.0, -1.0, f64::NAN] {
            assert!(
                sell_shares(
                    &position,
                    &pool,
                    &binary_kind(pool),
                    &NoFees,
                    bad,
                    Outcome::No
                )
                .is_err()
            );
        }
    }
}
