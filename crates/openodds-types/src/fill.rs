//! Settled units of trade: fills and the order diffs that accompany them.

use serde::{Deserialize, Serialize};

use crate::{AnswerId, Fees, FillId, OrderId, Outcome, UserId};

/// What the taker traded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillSource {
    /// Filled against the AMM pool.
    Pool,
    /// Filled against a specific resting order.
    Maker(OrderId),
}

/// One unit of settled trade, from the taker's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: FillId,
    pub user_id: UserId,
    pub outcome: Outcome,
    pub answer_id: Option<AnswerId>,
    /// Amount the taker spent on this fill, fee included.
    pub amount_spent: f64,
    pub shares_received: f64,
    pub prob_before: f64,
    pub prob_after: f64,
    pub fees: Fees,
    pub source: FillSource,
}

impl Fill {
    /// The order this fill matched, if it was a maker fill.
    #[must_use]
    pub fn matched_order_id(&self) -> Option<OrderId> {
        match self.source {
            FillSource::Pool => None,
            FillSource::Maker(id) => Some(id),
        }
    }
}

/// How a resting order changed during matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDiff {
    pub order_id: OrderId,
    pub maker_id: UserId,
    /// Maker currency committed to fills during this request.
    pub amount_filled: f64,
    /// Shares of the maker's outcome bought by those fills.
    pub shares_bought: f64,
    pub new_remaining: f64,
    /// `true` once the order leaves the book (filled or expired).
    pub removed: bool,
}
