//! Resolution payout calculator.
//!
//! Pure function from the terminal state of a contract (final pools, the
//! recorded bets and liquidity events, and the resolution) to the payout
//! lines owed. Recomputing with the same inputs yields the same lines in
//! the same order, so settlement is safely re-runnable.
//!
//! Two populations get paid:
//!
//! - **Bettors** receive the resolved value of the shares their bets
//!   bought. `Cancel` refunds the original stake instead, fees included.
//! - **Liquidity providers** split the residual value of the final pool
//!   reserves, plus the accrued subsidy pool, pro rata by the liquidity
//!   shares they still hold.

use std::collections::BTreeMap;

use openodds_types::constants::EPSILON;
use openodds_types::{
    AnswerId, Bet, Contract, ContractKind, LiquidityProvision, OpenoddsError, Outcome, Payout,
    PayoutKind, Resolution, Result, UserId,
};

/// Resolved value of one YES share and one NO share.
#[derive(Debug, Clone, Copy)]
struct ShareValue {
    yes: f64,
    no: f64,
}

impl ShareValue {
    fn of(self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Yes => self.yes,
            Outcome::No => self.no,
        }
    }
}

/// Share values for a single-pool contract.
fn single_pool_values(resolution: &Resolution) -> Result<ShareValue> {
    match resolution {
        Resolution::Yes => Ok(ShareValue { yes: 1.0, no: 0.0 }),
        Resolution::No => Ok(ShareValue { yes: 0.0, no: 1.0 }),
        Resolution::Mkt(p) => Ok(ShareValue {
            yes: *p,
            no: 1.0 - p,
        }),
        Resolution::Cancel => Err(OpenoddsError::Internal(
            "cancel handled before share valuation".into(),
        )),
        Resolution::ChooseAnswer(_) | Resolution::MultiMkt(_) => {
            Err(OpenoddsError::InvalidRequest {
                reason: "answer-indexed resolution on a single-pool contract".into(),
            })
        }
    }
}

/// Share values for one answer of a multiple-choice contract.
fn answer_values(answer_id: AnswerId, resolution: &Resolution) -> Result<ShareValue> {
    match resolution {
        Resolution::ChooseAnswer(chosen) => {
            if answer_id == *chosen {
                Ok(ShareValue { yes: 1.0, no: 0.0 })
            } else {
                Ok(ShareValue { yes: 0.0, no: 1.0 })
            }
        }
        Resolution::MultiMkt(weights) => weights
            .iter()
            .find(|(id, _)| *id == answer_id)
            .map(|(_, w)| ShareValue {
                yes: *w,
                no: 1.0 - w,
            })
            .ok_or_else(|| OpenoddsError::InvalidRequest {
                reason: format!("resolution has no weight for answer {answer_id}"),
            }),
        _ => Err(OpenoddsError::InvalidRequest {
            reason: "multiple-choice contract needs an answer-indexed resolution".into(),
        }),
    }
}

/// Share values applicable to one bet under this contract and resolution.
fn bet_values(kind: &ContractKind, bet: &Bet, resolution: &Resolution) -> Result<ShareValue> {
    match kind {
        ContractKind::Binary { .. }
        | ContractKind::PseudoNumeric { .. }
        | ContractKind::Stonk { .. } => single_pool_values(resolution),
        ContractKind::MultipleChoice { .. } => {
            let answer_id = bet.answer_id.ok_or_else(|| OpenoddsError::InvalidRequest {
                reason: "bet on a multiple-choice contract has no answer".into(),
            })?;
            answer_values(answer_id, resolution)
        }
    }
}

/// Resolved value of the final pool reserves across the whole contract.
fn residual_pool_value(kind: &ContractKind, resolution: &Resolution) -> Result<f64> {
    match kind {
        ContractKind::Binary { pool }
        | ContractKind::PseudoNumeric { pool, .. }
        | ContractKind::Stonk { pool } => {
            let values = single_pool_values(resolution)?;
            Ok(pool.yes_shares * values.yes + pool.no_shares * values.no)
        }
        ContractKind::MultipleChoice { answers, .. } => {
            let mut total = 0.0;
            for answer in answers {
                let values = answer_values(answer.id, resolution)?;
                total += answer.pool.yes_shares * values.yes + answer.pool.no_shares * values.no;
            }
            Ok(total)
        }
    }
}

/// Accumulate an amount into a user's payout line.
fn credit(
    lines: &mut BTreeMap<(UserId, PayoutKind), f64>,
    user_id: UserId,
    kind: PayoutKind,
    amount: f64,
) {
    *lines.entry((user_id, kind)).or_insert(0.0) += amount;
}

/// Compute every payout owed at resolution.
///
/// Output is aggregated to one line per `(user, kind)`, sorted by user
/// then kind, with immaterial dust lines dropped. The function never
/// mutates its inputs; running it twice produces identical output.
pub fn compute_payouts(
    contract: &Contract,
    bets: &[Bet],
    provisions: &[LiquidityProvision],
    resolution: &Resolution,
) -> Result<Vec<Payout>> {
    resolution.validate()?;

    let mut lines: BTreeMap<(UserId, PayoutKind), f64> = BTreeMap::new();

    if *resolution == Resolution::Cancel {
        // Void: everyone gets back what they put in. Fees already routed
        // to the platform and creator are not clawed back, so the refund
        // is the full original stake.
        for bet in bets {
            credit(&mut lines, bet.user_id, PayoutKind::Bettor, bet.amount);
        }
        let mut net: BTreeMap<UserId, f64> = BTreeMap::new();
        for provision in provisions {
            *net.entry(provision.user_id).or_insert(0.0) += provision.signed_amount();
        }
        for (user_id, amount) in net {
            if amount > EPSILON {
                credit(&mut lines, user_id, PayoutKind::LiquidityProvider, amount);
            }
        }
    } else {
        for bet in bets {
            let values = bet_values(&contract.kind, bet, resolution)?;
            credit(
                &mut lines,
                bet.user_id,
                PayoutKind::Bettor,
                bet.shares * values.of(bet.outcome),
            );
        }

        // LP pot: what the reserves are worth at the resolved price, plus
        // the fee subsidy accrued over the contract's life.
        let pot = residual_pool_value(&contract.kind, resolution)? + contract.subsidy_pool;
        let total_shares: f64 = provisions.iter().map(LiquidityProvision::signed_shares).sum();
        if pot > EPSILON && total_shares > EPSILON {
            let mut held: BTreeMap<UserId, f64> = BTreeMap::new();
            for provision in provisions {
                *held.entry(provision.user_id).or_insert(0.0) += provision.signed_shares();
            }
            for (user_id, shares) in held {
                if shares > EPSILON {
                    credit(
                        &mut lines,
                        user_id,
                        PayoutKind::LiquidityProvider,
                        pot * shares / total_shares,
                    );
                }
            }
        }
    }

    let payouts: Vec<Payout> = lines
        .into_iter()
        .map(|((user_id, kind), amount)| Payout {
            user_id,
            amount,
            kind,
        })
        .filter(Payout::is_material)
        .collect();

    tracing::debug!(
        contract = %contract.id,
        lines = payouts.len(),
        total = payouts.iter().map(|p| p.amount).sum::<f64>(),
        "computed resolution payouts"
    );
    Ok(payouts)
}
