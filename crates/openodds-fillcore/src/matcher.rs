//! Pure deterministic fill engine.
//!
//! The core matching function: takes a pool, an order-book snapshot,
//! participant balances, and one trade request, and produces the fills.
//! This is the **only** mutation-free surface the matching plane exposes —
//! no side effects, no persistence, no clock reads.
//!
//! ```text
//! fill_request(pool, book, balances, request) -> FillOutput
//! ```
//!
//! ## Price priority
//!
//! Each step compares the best opposite-side maker against the pool's
//! marginal price and fills whichever is more favorable to the taker.
//! Makers at equal price fill FIFO by age. A pool fill runs only up to the
//! point where the pool stops beating the next maker (or the taker's limit),
//! so priority is never violated mid-fill.
//!
//! ## Determinism Guarantee
//!
//! Identical `(pool, book snapshot, balances, request)` produce the exact
//! same output — fills, IDs, diffs, and resting remainder.

use std::collections::HashMap;

use openodds_cpmm::fees::FeePolicy;
use openodds_cpmm::numeric::is_zero;
use openodds_cpmm::pricing::{amount_to_reach_prob, purchase};
use openodds_types::constants::{EPSILON, MAX_CPMM_PROB, MIN_CPMM_PROB};
use openodds_types::{
    AmmPool, BetRequest, ContractKind, Fees, Fill, FillId, FillSource, LimitOrder, OrderDiff,
    Outcome, Result, UserId, split_fee,
};

use crate::OrderBook;

/// Everything a matched trade request settles to.
#[derive(Debug, Clone, PartialEq)]
pub struct FillOutput {
    /// Ordered fills, taker perspective.
    pub fills: Vec<Fill>,
    /// Pool after all pool fills.
    pub new_pool: AmmPool,
    /// Changes to resting orders consumed or reduced by matching.
    pub order_diffs: Vec<OrderDiff>,
    /// The unfilled remainder of a limit request, ready to rest on the book.
    pub new_resting_order: Option<LimitOrder>,
    /// Amount that could not be filled (market request against an
    /// exhausted book and pool).
    pub unfilled_amount: f64,
}

impl FillOutput {
    /// Total shares the taker received.
    #[must_use]
    pub fn total_shares(&self) -> f64 {
        self.fills.iter().map(|f| f.shares_received).sum()
    }

    /// Total amount the taker spent, fees included.
    #[must_use]
    pub fn total_spent(&self) -> f64 {
        self.fills.iter().map(|f| f.amount_spent).sum()
    }

    /// Total fees across all fills.
    #[must_use]
    pub fn total_fees(&self) -> Fees {
        self.fills.iter().map(|f| f.fees).sum()
    }
}

/// The pool probability past which a taker will not trade, considering its
/// own limit and the hard CPMM bound.
fn taker_bound(outcome: Outcome, limit_prob: Option<f64>) -> f64 {
    match outcome {
        Outcome::Yes => limit_prob.unwrap_or(MAX_CPMM_PROB).min(MAX_CPMM_PROB),
        Outcome::No => limit_prob.unwrap_or(MIN_CPMM_PROB).max(MIN_CPMM_PROB),
    }
}

/// `true` if `price` is at or inside the taker's acceptable range.
fn price_acceptable(outcome: Outcome, price: f64, bound: f64) -> bool {
    match outcome {
        Outcome::Yes => price <= bound + EPSILON,
        Outcome::No => price >= bound - EPSILON,
    }
}

/// `true` if the maker's price beats (or ties) the pool for the taker.
fn maker_beats_pool(outcome: Outcome, maker_prob: f64, pool_prob: f64) -> bool {
    match outcome {
        Outcome::Yes => maker_prob <= pool_prob + EPSILON,
        Outcome::No => maker_prob >= pool_prob - EPSILON,
    }
}

/// Match one trade request against the book and the pool.
///
/// `balances` caps how much each *maker* can actually commit; a maker
/// missing from the map is treated as fully funded. The taker's own
/// balance is the caller's concern — `request.amount` is taken as already
/// reserved.
#[allow(clippy::too_many_lines)]
pub fn fill_request(
    pool: &AmmPool,
    kind: &ContractKind,
    book: &OrderBook,
    balances: &HashMap<UserId, f64>,
    policy: &dyn FeePolicy,
    request: &BetRequest,
) -> Result<FillOutput> {
    request.validate()?;
    pool.validate()?;

    let outcome = request.outcome;
    let bound = taker_bound(outcome, request.limit_prob);
    let makers = book.makers_in_priority(outcome);

    let mut remaining = request.amount;
    let mut cur_pool = *pool;
    let mut fills: Vec<Fill> = Vec::new();
    let mut diffs: Vec<OrderDiff> = Vec::new();
    let mut fill_seq: u64 = 0;
    // Maker funds drawn down across this request.
    let mut maker_funds: HashMap<UserId, f64> = HashMap::new();

    let mut maker_idx = 0;
    while remaining > EPSILON {
        // Next eligible maker: skip expired ones (reported removed) and
        // makers priced past the taker's bound.
        let maker = loop {
            let Some(candidate) = makers.get(maker_idx) else {
                break None;
            };
            if candidate.is_expired_at(request.placed_at) {
                diffs.push(OrderDiff {
                    order_id: candidate.id,
                    maker_id: candidate.user_id,
                    amount_filled: 0.0,
                    shares_bought: 0.0,
                    new_remaining: candidate.remaining,
                    removed: true,
                });
                maker_idx += 1;
                continue;
            }
            if !price_acceptable(outcome, candidate.limit_prob, bound) {
                // Priority order means every later maker is worse; done
                // with the book.
                break None;
            }
            break Some(candidate);
        };

        let pool_prob = cur_pool.probability();

        match maker {
            Some(maker) if maker_beats_pool(outcome, maker.limit_prob, pool_prob) => {
                let taker_price = outcome.share_price(maker.limit_prob);
                let maker_price = maker.outcome.share_price(maker.limit_prob);

                let funds = maker_funds
                    .entry(maker.user_id)
                    .or_insert_with(|| balances.get(&maker.user_id).copied().unwrap_or(f64::MAX));
                let maker_avail = maker.remaining.min(*funds);
                if maker_avail <= EPSILON {
                    // Unfunded maker: leave it resting, move past it.
                    maker_idx += 1;
                    continue;
                }

                let shares = (remaining / taker_price).min(maker_avail / maker_price);
                let taker_spent = shares * taker_price;
                let maker_spent = shares * maker_price;

                *funds -= maker_spent;
                let new_remaining = (maker.remaining - maker_spent).max(0.0);
                let consumed = new_remaining <= EPSILON;

                fills.push(Fill {
                    id: FillId::deterministic(request.id, fill_seq),
                    user_id: request.user_id,
                    outcome,
                    answer_id: request.answer_id,
                    amount_spent: taker_spent,
                    shares_received: shares,
                    prob_before: pool_prob,
                    prob_after: pool_prob,
                    fees: Fees::ZERO,
                    source: FillSource::Maker(maker.id),
                });
                fill_seq += 1;

                diffs.push(OrderDiff {
                    order_id: maker.id,
                    maker_id: maker.user_id,
                    amount_filled: maker_spent,
                    shares_bought: shares,
                    new_remaining: if consumed { 0.0 } else { new_remaining },
                    removed: consumed,
                });

                remaining -= taker_spent;
                if consumed || *funds <= EPSILON {
                    maker_idx += 1;
                }
            }
            maker => {
                // Pool fill, bounded by the next maker's price and the
                // taker's own limit.
                if !price_acceptable(outcome, pool_prob, bound)
                    || is_zero(bound - pool_prob)
                {
                    break;
                }
                let target = match maker {
                    Some(m) => match outcome {
                        Outcome::Yes => m.limit_prob.min(bound),
                        Outcome::No => m.limit_prob.max(bound),
                    },
                    None => bound,
                };

                let net_needed = amount_to_reach_prob(&cur_pool, target, outcome)?;
                if is_zero(net_needed) {
                    // Pool already at the target; nothing tradeable left.
                    break;
                }

                // Gross up so the net of fee lands exactly on the target;
                // a few fixpoint steps settle any amount-proportional
                // policy.
                let mut gross_to_target = net_needed;
                for _ in 0..4 {
                    gross_to_target =
                        net_needed + policy.taker_fee(gross_to_target, pool_prob, target);
                }

                let (gross, net) = if gross_to_target >= remaining - EPSILON {
                    // Taker exhausts before the target: probe the landing
                    // probability for the fee quote.
                    let (_, probe) = purchase(&cur_pool, remaining, outcome)?;
                    let fee = policy.taker_fee(remaining, pool_prob, probe.probability());
                    (remaining, remaining - fee)
                } else {
                    let fee = policy.taker_fee(gross_to_target, pool_prob, target);
                    (gross_to_target, gross_to_target - fee)
                };

                let (shares, next_pool) = purchase(&cur_pool, net, outcome)?;
                let prob_after = next_pool.probability();
                let fees = split_fee(gross - net, kind);

                fills.push(Fill {
                    id: FillId::deterministic(request.id, fill_seq),
                    user_id: request.user_id,
                    outcome,
                    answer_id: request.answer_id,
                    amount_spent: gross,
                    shares_received: shares,
                    prob_before: pool_prob,
                    prob_after,
                    fees,
                    source: FillSource::Pool,
                });
                fill_seq += 1;

                cur_pool = next_pool;
                remaining -= gross;
            }
        }
    }

    let remaining = remaining.max(0.0);
    let new_resting_order = match request.limit_prob {
        Some(limit_prob) if remaining > EPSILON => Some(LimitOrder {
            id: request.id,
            user_id: request.user_id,
            outcome,
            answer_id: request.answer_id,
            limit_prob,
            amount: request.amount,
            remaining,
            created_at: request.placed_at,
            expires_at: request.expires_at,
        }),
        _ => None,
    };
    let unfilled_amount = if new_resting_order.is_some() {
        0.0
    } else {
        remaining
    };

    tracing::debug!(
        request = %request.id,
        fills = fills.len(),
        spent = request.amount - remaining,
        resting = new_resting_order.is_some(),
        "matched trade request"
    );

    Ok(FillOutput {
        fills,
        new_pool: cur_pool,
        order_diffs: diffs,
        new_resting_order,
        unfilled_amount,
    })
}

/// Match a batch of requests in one call.
///
/// Requests are grouped by `(outcome, quantized limit)`: members of a
/// group are combined into a single solve and the resulting fills split
/// pro-rata by requested amount, so batch pricing never depends on
/// submission order within a group. Same-outcome requests at *different*
/// limits stay in separate groups; groups run in sorted key order against
/// the evolving pool and book, which keeps the whole batch deterministic
/// and submission-order independent.
///
/// Order diffs for a group are attached to its first member's output only,
/// so a caller that walks the outputs and applies each diff set through
/// [`OrderBook::apply_diffs`] commits every book change exactly once.
pub fn fill_batch(
    pool: &AmmPool,
    kind: &ContractKind,
    book: &OrderBook,
    balances: &HashMap<UserId, f64>,
    policy: &dyn FeePolicy,
    requests: &[BetRequest],
) -> Result<Vec<FillOutput>> {
    for request in requests {
        request.validate()?;
    }

    // Group indices by (outcome, quantized limit).
    let mut groups: Vec<((Outcome, Option<u32>), Vec<usize>)> = Vec::new();
    for (idx, request) in requests.iter().enumerate() {
        let key = (
            request.outcome,
            request
                .limit_prob
                .map(|p| openodds_types::ProbKey::from_prob(p).0),
        );
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(idx),
            None => groups.push((key, vec![idx])),
        }
    }
    groups.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut outputs: Vec<Option<FillOutput>> = vec![None; requests.len()];
    let mut cur_pool = *pool;
    let mut consumed: Vec<openodds_types::OrderId> = Vec::new();

    for ((outcome, _limit), members) in groups {
        let total: f64 = members.iter().map(|&i| requests[i].amount).sum();
        let lead = &requests[members[0]];
        let combined = BetRequest {
            amount: total,
            ..lead.clone()
        };

        // Re-snapshot the book minus orders consumed by earlier groups.
        let mut snapshot = OrderBook::new();
        for maker in book.makers_in_priority(outcome) {
            if !consumed.contains(&maker.id) {
                snapshot.insert_order(maker)?;
            }
        }

        let output = fill_request(&cur_pool, kind, &snapshot, balances, policy, &combined)?;
        cur_pool = output.new_pool;
        for diff in &output.order_diffs {
            if diff.removed {
                consumed.push(diff.order_id);
            }
        }

        for (position, &idx) in members.iter().enumerate() {
            let request = &requests[idx];
            let frac = request.amount / total;
            let fills = output
                .fills
                .iter()
                .enumerate()
                .map(|(seq, fill)| Fill {
                    id: FillId::deterministic(request.id, seq as u64),
                    user_id: request.user_id,
                    amount_spent: fill.amount_spent * frac,
                    shares_received: fill.shares_received * frac,
                    fees: Fees {
                        platform: fill.fees.platform * frac,
                        creator: fill.fees.creator * frac,
                        pool: fill.fees.pool * frac,
                    },
                    ..fill.clone()
                })
                .collect();
            let resting = output.new_resting_order.as_ref().map(|order| LimitOrder {
                id: request.id,
                user_id: request.user_id,
                amount: request.amount,
                remaining: order.remaining * frac,
                created_at: request.placed_at,
                expires_at: request.expires_at,
                ..order.clone()
            });
            outputs[idx] = Some(FillOutput {
                fills,
                new_pool: cur_pool,
                // The group's book changes, reported once.
                order_diffs: if position == 0 {
                    output.order_diffs.clone()
                } else {
                    Vec::new()
                },
                new_resting_order: resting,
                unfilled_amount: output.unfilled_amount * frac,
            });
        }
    }

    outputs
        .into_iter()
        .map(|output| {
            output.ok_or_else(|| {
                openodds_types::OpenoddsError::Internal("request missed in batch grouping".into())
            })
        })
        .collect()
}
