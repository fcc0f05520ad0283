//! A single price level in the limit order book.
//!
//! Orders at the same limit probability are stored in FIFO order (time
//! priority) using a [`VecDeque`].

use std::collections::VecDeque;

use openodds_types::{LimitOrder, OrderId, ProbKey};

/// All resting orders at one limit probability.
///
/// Orders are stored in arrival order (FIFO) -- the front of the deque
/// has the highest time priority and will be filled first.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// The limit probability at this level.
    pub prob: ProbKey,
    /// Orders in time-priority order (front = oldest = highest priority).
    pub orders: VecDeque<LimitOrder>,
}

impl PriceLevel {
    /// Create a new empty price level.
    #[must_use]
    pub fn new(prob: ProbKey) -> Self {
        Self {
            prob,
            orders: VecDeque::new(),
        }
    }

    /// Add an order to the back of this level (lowest time priority).
    pub fn push_back(&mut self, order: LimitOrder) {
        self.orders.push_back(order);
    }

    /// Remove and return the front (oldest / highest priority) order.
    pub fn pop_front(&mut self) -> Option<LimitOrder> {
        self.orders.pop_front()
    }

    /// Peek at the front order without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&LimitOrder> {
        self.orders.front()
    }

    /// Total unfilled maker amount across all orders at this level.
    #[must_use]
    pub fn total_remaining(&self) -> f64 {
        self.orders.iter().map(|o| o.remaining).sum()
    }

    /// Remove a specific order by ID. Returns the removed order, or `None`.
    pub fn remove_order(&mut self, order_id: &OrderId) -> Option<LimitOrder> {
        let pos = self.orders.iter().position(|o| o.id == *order_id)?;
        self.orders.remove(pos)
    }

    /// Returns `true` if there are no orders at this level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of orders at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }
}
