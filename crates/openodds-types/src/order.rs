//! Resting limit orders and incoming trade requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_CPMM_PROB, MIN_CPMM_PROB};
use crate::{AnswerId, OpenoddsError, OrderId, Outcome, Result, UserId};

// ---------------------------------------------------------------------------
// ProbKey
// ---------------------------------------------------------------------------

/// Probability as an ordered integer key (micro-probability units).
///
/// `f64` is not `Ord`, so the order book keys its `BTreeMap` price levels on
/// this fixed-point representation. One micro unit is far below the engine
/// epsilon, so the conversion never reorders distinguishable prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ProbKey(pub u32);

impl ProbKey {
    const SCALE: f64 = 1_000_000.0;

    /// Quantize a probability in `(0,1)` to a key.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_prob(prob: f64) -> Self {
        Self((prob * Self::SCALE).round() as u32)
    }

    #[must_use]
    pub fn to_prob(self) -> f64 {
        f64::from(self.0) / Self::SCALE
    }
}

impl std::fmt::Display for ProbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.to_prob())
    }
}

// ---------------------------------------------------------------------------
// LimitOrder
// ---------------------------------------------------------------------------

/// A resting limit order: the unfilled remainder of a trade request that
/// supplied a `limit_prob`.
///
/// `amount` and `remaining` are denominated in the maker's own currency
/// (what the maker still has committed, not shares). Price priority first,
/// then FIFO by `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub outcome: Outcome,
    pub answer_id: Option<AnswerId>,
    /// The YES-probability at which this maker is willing to trade.
    pub limit_prob: f64,
    /// Total amount originally committed.
    pub amount: f64,
    /// Amount still uncommitted to fills.
    pub remaining: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LimitOrder {
    /// `true` once the order has nothing left to fill.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.remaining <= 0.0
    }

    /// `true` if the order has lapsed at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }

    /// Price of one share from the maker's perspective.
    ///
    /// A YES maker pays `limit_prob` per YES share; a NO maker pays
    /// `1 - limit_prob` per NO share.
    #[must_use]
    pub fn maker_share_price(&self) -> f64 {
        self.outcome.share_price(self.limit_prob)
    }

    /// Book key for this order's price level.
    #[must_use]
    pub fn prob_key(&self) -> ProbKey {
        ProbKey::from_prob(self.limit_prob)
    }
}

// ---------------------------------------------------------------------------
// BetRequest
// ---------------------------------------------------------------------------

/// An incoming trade request, before matching.
///
/// `placed_at` is supplied by the caller: the engine never reads the wall
/// clock, so identical requests replay to identical outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRequest {
    pub id: OrderId,
    pub user_id: UserId,
    pub outcome: Outcome,
    pub amount: f64,
    /// If set, the request will not trade past this YES-probability and any
    /// unfilled remainder becomes a resting [`LimitOrder`].
    pub limit_prob: Option<f64>,
    pub answer_id: Option<AnswerId>,
    pub expires_at: Option<DateTime<Utc>>,
    pub placed_at: DateTime<Utc>,
}

impl BetRequest {
    /// Reject non-positive / non-finite amounts and out-of-bounds limits
    /// before any matching work.
    pub fn validate(&self) -> Result<()> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(OpenoddsError::InvalidAmount {
                amount: self.amount,
            });
        }
        if let Some(limit) = self.limit_prob {
            if !limit.is_finite() || !(MIN_CPMM_PROB..=MAX_CPMM_PROB).contains(&limit) {
                return Err(OpenoddsError::ProbabilityOutOfBounds { prob: limit });
            }
        }
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl LimitOrder {
    pub fn dummy(outcome: Outcome, limit_prob: f64, amount: f64) -> Self {
        Self {
            id: OrderId::new(),
            user_id: UserId::new(),
            outcome,
            answer_id: None,
            limit_prob,
            amount,
            remaining: amount,
            created_at: Utc::now(),
            expires_at: None,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl BetRequest {
    pub fn dummy(outcome: Outcome, amount: f64) -> Self {
        Self {
            id: OrderId::new(),
            user_id: UserId::new(),
            outcome,
            amount,
            limit_prob: None,
            answer_id: None,
            expires_at: None,
            placed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit_prob: f64) -> Self {
        self.limit_prob = Some(limit_prob);
        self
    }
}
