//! Resolutions and payouts: the terminal state of a contract.

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::{AnswerId, OpenoddsError, Result, UserId};

/// How a question resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    /// Binary YES: 1 per YES share.
    Yes,
    /// Binary NO: 1 per NO share.
    No,
    /// Resolve at a market probability: `p` per YES share, `1-p` per NO.
    Mkt(f64),
    /// Void the question: refund original amounts spent and contributions.
    Cancel,
    /// Multiple choice: the chosen answer's YES pays 1, every other
    /// answer's NO pays 1.
    ChooseAnswer(AnswerId),
    /// Multiple choice at market probabilities, answer-indexed. Weights
    /// must sum to 1 for a sum-to-one contract.
    MultiMkt(Vec<(AnswerId, f64)>),
}

impl Resolution {
    /// Validate probabilities before payout computation.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Mkt(p) => {
                if !p.is_finite() || !(0.0..=1.0).contains(p) {
                    return Err(OpenoddsError::ProbabilityOutOfBounds { prob: *p });
                }
            }
            Self::MultiMkt(weights) => {
                let mut sum = 0.0;
                for (_, p) in weights {
                    if !p.is_finite() || !(0.0..=1.0).contains(p) {
                        return Err(OpenoddsError::ProbabilityOutOfBounds { prob: *p });
                    }
                    sum += p;
                }
                if (sum - 1.0).abs() > 1e-6 {
                    return Err(OpenoddsError::InvalidRequest {
                        reason: format!("MultiMkt weights sum to {sum}, expected 1"),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Who a payout goes to and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PayoutKind {
    Bettor,
    LiquidityProvider,
}

impl std::fmt::Display for PayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bettor => write!(f, "BETTOR"),
            Self::LiquidityProvider => write!(f, "LIQUIDITY_PROVIDER"),
        }
    }
}

/// One payout line. Zero-amount lines are dropped before output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub user_id: UserId,
    pub amount: f64,
    pub kind: PayoutKind,
}

impl Payout {
    /// `true` if the amount is large enough to matter.
    #[must_use]
    pub fn is_material(&self) -> bool {
        self.amount > EPSILON
    }
}
