//! The liquidity ledger: reserve deltas in, LP ownership shares out.
//!
//! Adding liquidity puts the full amount into *both* reserves (one unit of
//! currency mints a matched YES/NO pair) and re-derives the pool weight so
//! the quoted probability is unchanged while `k` grows. Removal burns LP
//! shares for a proportional slice of both reserves, which preserves both
//! the weight and the probability.

use std::collections::HashMap;

use openodds_types::{AmmPool, OpenoddsError, Result, UserId};
use serde::{Deserialize, Serialize};

/// Mint LP shares for a contribution at the current price ratio.
///
/// Returns `(lp_shares_minted, new_pool)`. Minted shares are measured in
/// invariant units: the increase in `k` the contribution produced.
pub fn add_liquidity(pool: &AmmPool, amount: f64) -> Result<(f64, AmmPool)> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(OpenoddsError::InvalidAmount { amount });
    }
    pool.validate()?;

    let prob = pool.probability();
    let yes = pool.yes_shares + amount;
    let no = pool.no_shares + amount;

    // Re-derive the weight so probability is preserved with the new
    // reserves: p' / (1-p') = prob * yes' / ((1-prob) * no').
    let odds = prob * yes / ((1.0 - prob) * no);
    let p = odds / (1.0 + odds);

    let mut new_pool = AmmPool {
        yes_shares: yes,
        no_shares: no,
        p,
        total_liquidity_shares: pool.total_liquidity_shares,
    };
    let minted = new_pool.invariant_k() - pool.invariant_k();
    new_pool.total_liquidity_shares += minted;
    new_pool.validate()?;
    Ok((minted, new_pool))
}

/// Reserves returned for burning LP shares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservesReturned {
    pub yes_shares: f64,
    pub no_shares: f64,
}

/// Burn LP shares for a proportional slice of current reserves.
pub fn remove_liquidity(pool: &AmmPool, lp_shares: f64) -> Result<(ReservesReturned, AmmPool)> {
    if !(lp_shares.is_finite() && lp_shares > 0.0) {
        return Err(OpenoddsError::InvalidAmount { amount: lp_shares });
    }
    pool.validate()?;
    if lp_shares > pool.total_liquidity_shares {
        return Err(OpenoddsError::InsufficientLiquidityShares {
            needed: lp_shares,
            available: pool.total_liquidity_shares,
        });
    }

    let frac = lp_shares / pool.total_liquidity_shares;
    let returned = ReservesReturned {
        yes_shares: frac * pool.yes_shares,
        no_shares: frac * pool.no_shares,
    };
    let new_pool = AmmPool {
        yes_shares: pool.yes_shares - returned.yes_shares,
        no_shares: pool.no_shares - returned.no_shares,
        p: pool.p,
        total_liquidity_shares: pool.total_liquidity_shares - lp_shares,
    };
    new_pool.validate()?;
    Ok((returned, new_pool))
}

/// Per-user cumulative liquidity tracker.
///
/// The engine itself is stateless; callers feed every provision through
/// this ledger and hand its totals to the payout calculator at resolution.
#[derive(Debug, Clone, Default)]
pub struct LiquidityLedger {
    /// Net currency contribution per user since contract creation.
    contributions: HashMap<UserId, f64>,
    /// Net LP shares held per user.
    shares: HashMap<UserId, f64>,
}

impl LiquidityLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an add: currency in, shares minted.
    pub fn record_add(&mut self, user_id: UserId, amount: f64, lp_shares: f64) {
        *self.contributions.entry(user_id).or_insert(0.0) += amount;
        *self.shares.entry(user_id).or_insert(0.0) += lp_shares;
    }

    /// Record a removal: shares burned, currency out.
    pub fn record_remove(&mut self, user_id: UserId, amount_out: f64, lp_shares: f64) {
        *self.contributions.entry(user_id).or_insert(0.0) -= amount_out;
        *self.shares.entry(user_id).or_insert(0.0) -= lp_shares;
    }

    /// Net currency contribution for a user.
    #[must_use]
    pub fn net_contribution(&self, user_id: UserId) -> f64 {
        self.contributions.get(&user_id).copied().unwrap_or(0.0)
    }

    /// LP shares currently held by a user.
    #[must_use]
    pub fn shares_held(&self, user_id: UserId) -> f64 {
        self.shares.get(&user_id).copied().unwrap_or(0.0)
    }

    /// All users with a nonzero ledger entry.
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.shares.keys().copied()
    }
}
