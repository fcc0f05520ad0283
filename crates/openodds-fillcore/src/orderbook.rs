//! The limit order book for a single answer.
//!
//! Uses `BTreeMap` for price-level ordering:
//! - **YES makers**: `BTreeMap<Reverse<ProbKey>, PriceLevel>` -- highest
//!   limit probability first (best for an incoming NO taker)
//! - **NO makers**: `BTreeMap<ProbKey, PriceLevel>` -- lowest limit
//!   probability first (best for an incoming YES taker)
//!
//! An auxiliary `HashMap<OrderId, (Outcome, ProbKey)>` enables O(log N)
//! cancellation. Expiry is a snapshot sweep the caller runs with its own
//! clock instant; the book never reads wall time.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use openodds_types::{LimitOrder, OpenoddsError, OrderDiff, OrderId, Outcome, ProbKey, Result};

use crate::price_level::PriceLevel;

/// The resting-order book for one answer (or one binary contract).
#[derive(Debug, Default)]
pub struct OrderBook {
    /// YES makers: highest limit probability first (`Reverse` key).
    yes_side: BTreeMap<Reverse<ProbKey>, PriceLevel>,
    /// NO makers: lowest limit probability first.
    no_side: BTreeMap<ProbKey, PriceLevel>,
    /// Fast lookup: `OrderId -> (side, prob)` for O(log N) cancel.
    index: HashMap<OrderId, (Outcome, ProbKey)>,
}

impl OrderBook {
    /// Create a new empty order book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Insert a single resting order at its limit probability.
    pub fn insert_order(&mut self, order: LimitOrder) -> Result<()> {
        if self.index.contains_key(&order.id) {
            return Err(OpenoddsError::DuplicateOrder(order.id));
        }
        if order.is_filled() {
            return Err(OpenoddsError::StaleOrder(order.id));
        }

        let prob = order.prob_key();
        self.index.insert(order.id, (order.outcome, prob));

        match order.outcome {
            Outcome::Yes => {
                self.yes_side
                    .entry(Reverse(prob))
                    .or_insert_with(|| PriceLevel::new(prob))
                    .push_back(order);
            }
            Outcome::No => {
                self.no_side
                    .entry(prob)
                    .or_insert_with(|| PriceLevel::new(prob))
                    .push_back(order);
            }
        }
        Ok(())
    }

    // =================================================================
    // Cancellation & expiry
    // =================================================================

    /// Cancel an order by ID. Returns the removed order.
    pub fn cancel_order(&mut self, order_id: &OrderId) -> Result<LimitOrder> {
        let (side, prob) = self
            .index
            .remove(order_id)
            .ok_or(OpenoddsError::OrderNotFound(*order_id))?;

        let order = match side {
            Outcome::Yes => {
                let level = self
                    .yes_side
                    .get_mut(&Reverse(prob))
                    .ok_or(OpenoddsError::OrderNotFound(*order_id))?;
                let order = level
                    .remove_order(order_id)
                    .ok_or(OpenoddsError::OrderNotFound(*order_id))?;
                if level.is_empty() {
                    self.yes_side.remove(&Reverse(prob));
                }
                order
            }
            Outcome::No => {
                let level = self
                    .no_side
                    .get_mut(&prob)
                    .ok_or(OpenoddsError::OrderNotFound(*order_id))?;
                let order = level
                    .remove_order(order_id)
                    .ok_or(OpenoddsError::OrderNotFound(*order_id))?;
                if level.is_empty() {
                    self.no_side.remove(&prob);
                }
                order
            }
        };

        Ok(order)
    }

    /// Remove every order expired at `now`. Returns the removed orders.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<LimitOrder> {
        let expired: Vec<OrderId> = self
            .index
            .keys()
            .copied()
            .filter(|id| {
                self.find_order(id)
                    .is_some_and(|o| o.is_expired_at(now))
            })
            .collect();
        let mut removed: Vec<LimitOrder> = expired
            .iter()
            .filter_map(|id| self.cancel_order(id).ok())
            .collect();
        // HashMap iteration order is arbitrary; give callers a stable order.
        removed.sort_by_key(|o| o.id);
        removed
    }

    /// Apply matcher output back onto the book: decrement remainders,
    /// drop consumed orders. Partial fills keep their place in the FIFO
    /// queue.
    pub fn apply_diffs(&mut self, diffs: &[OrderDiff]) -> Result<()> {
        for diff in diffs {
            if diff.removed {
                self.cancel_order(&diff.order_id)?;
                continue;
            }
            let (side, prob) = *self
                .index
                .get(&diff.order_id)
                .ok_or(OpenoddsError::OrderNotFound(diff.order_id))?;
            let level = match side {
                Outcome::Yes => self.yes_side.get_mut(&Reverse(prob)),
                Outcome::No => self.no_side.get_mut(&prob),
            }
            .ok_or(OpenoddsError::OrderNotFound(diff.order_id))?;
            let order = level
                .orders
                .iter_mut()
                .find(|o| o.id == diff.order_id)
                .ok_or(OpenoddsError::OrderNotFound(diff.order_id))?;
            order.remaining = diff.new_remaining;
        }
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Look up an order anywhere in the book.
    #[must_use]
    pub fn find_order(&self, order_id: &OrderId) -> Option<&LimitOrder> {
        let (side, prob) = self.index.get(order_id)?;
        let level = match side {
            Outcome::Yes => self.yes_side.get(&Reverse(*prob))?,
            Outcome::No => self.no_side.get(prob)?,
        };
        level.orders.iter().find(|o| o.id == *order_id)
    }

    /// Best opposite-side maker price for an incoming taker, as a
    /// YES-probability. Lowest NO-maker prob for a YES taker, highest
    /// YES-maker prob for a NO taker.
    #[must_use]
    pub fn best_maker_prob(&self, taker: Outcome) -> Option<f64> {
        match taker {
            Outcome::Yes => self.no_side.keys().next().map(|k| k.to_prob()),
            Outcome::No => self.yes_side.keys().next().map(|k| k.0.to_prob()),
        }
    }

    /// Opposite-side makers for a taker, in price-then-age priority.
    ///
    /// Cloned out of the book: the matcher works on a snapshot and reports
    /// diffs rather than mutating in place.
    #[must_use]
    pub fn makers_in_priority(&self, taker: Outcome) -> Vec<LimitOrder> {
        let mut makers = Vec::new();
        match taker {
            Outcome::Yes => {
                for level in self.no_side.values() {
                    makers.extend(level.orders.iter().cloned());
                }
            }
            Outcome::No => {
                for level in self.yes_side.values() {
                    makers.extend(level.orders.iter().cloned());
                }
            }
        }
        makers
    }

    /// Total number of orders currently in the book.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Number of distinct YES-maker price levels.
    #[must_use]
    pub fn yes_depth(&self) -> usize {
        self.yes_side.len()
    }

    /// Number of distinct NO-maker price levels.
    #[must_use]
    pub fn no_depth(&self) -> usize {
        self.no_side.len()
    }

    /// Returns `true` if the book has no orders on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if an order exists in the book.
    #[must_use]
    pub fn contains_order(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }
}
