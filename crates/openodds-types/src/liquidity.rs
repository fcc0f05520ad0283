//! Liquidity provision records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnswerId, UserId};

/// Whether liquidity entered or left the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityDirection {
    Add,
    Remove,
}

/// One liquidity event: a user adding to or withdrawing from a pool.
///
/// `amount` is positive in both directions; `direction` carries the sign.
/// `Cancel` resolutions refund the net of a user's provisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityProvision {
    pub user_id: UserId,
    pub answer_id: Option<AnswerId>,
    pub direction: LiquidityDirection,
    /// Currency amount moved.
    pub amount: f64,
    /// Liquidity shares minted (add) or burned (remove).
    pub lp_shares: f64,
    pub timestamp: DateTime<Utc>,
}

impl LiquidityProvision {
    /// Signed currency contribution: positive for adds, negative for removes.
    #[must_use]
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            LiquidityDirection::Add => self.amount,
            LiquidityDirection::Remove => -self.amount,
        }
    }

    /// Signed LP-share delta.
    #[must_use]
    pub fn signed_shares(&self) -> f64 {
        match self.direction {
            LiquidityDirection::Add => self.lp_shares,
            LiquidityDirection::Remove => -self.lp_shares,
        }
    }
}
