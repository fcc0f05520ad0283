//! Bet records and share positions.
//!
//! A [`Bet`] is the durable record of one fill from the payout calculator's
//! point of view; a [`SharePosition`] is a user's aggregate YES/NO holding
//! on one answer, which the sale engine needs for the matched-pair
//! redemption shortcut.

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::{AnswerId, Outcome, UserId};

/// One recorded bet: what was spent and what was received.
///
/// `amount` is the original stake including fees — `Cancel` resolutions
/// refund exactly this value, not the share value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub user_id: UserId,
    pub answer_id: Option<AnswerId>,
    pub outcome: Outcome,
    pub amount: f64,
    pub shares: f64,
}

/// Aggregate YES/NO share counts held by one user on one answer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SharePosition {
    pub yes_shares: f64,
    pub no_shares: f64,
}

impl SharePosition {
    /// Shares held on a side.
    #[must_use]
    pub fn shares(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Yes => self.yes_shares,
            Outcome::No => self.no_shares,
        }
    }

    /// Matched YES/NO pairs redeemable 1:1 without touching the pool.
    #[must_use]
    pub fn redeemable_pairs(&self) -> f64 {
        let pairs = self.yes_shares.min(self.no_shares);
        if pairs > EPSILON { pairs } else { 0.0 }
    }

    /// Fold a bet's shares into the position.
    #[must_use]
    pub fn with_shares(mut self, outcome: Outcome, shares: f64) -> Self {
        match outcome {
            Outcome::Yes => self.yes_shares += shares,
            Outcome::No => self.no_shares += shares,
        }
        self
    }
}
