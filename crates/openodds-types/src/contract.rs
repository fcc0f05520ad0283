//! Contracts: a question plus the pool shape that prices it.
//!
//! The question "kind" is a closed sum type over pool shapes. The fill
//! engine and payout calculator are written against this variant's
//! capability set — there is no runtime field probing.

use serde::{Deserialize, Serialize};

use crate::{AmmPool, AnswerId, ContractId, OpenoddsError, Result, UserId};

/// One answer of a multiple-choice question. Owns an independent pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub pool: AmmPool,
}

/// Pool shape of a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContractKind {
    /// A single YES/NO question with one pool.
    Binary { pool: AmmPool },
    /// A question with several answers, each owning a pool. When
    /// `sum_to_one` is set the answers' probabilities are held to Σ = 1
    /// by the arbitrage solver.
    MultipleChoice {
        answers: Vec<Answer>,
        sum_to_one: bool,
    },
    /// A numeric question priced as a binary pool over a value range;
    /// probability maps linearly onto `[min, max]`.
    PseudoNumeric { pool: AmmPool, min: f64, max: f64 },
    /// A perpetual "stonk" with no resolution value other than MKT.
    Stonk { pool: AmmPool },
}

impl ContractKind {
    /// The single pool of a non-multi contract.
    pub fn single_pool(&self) -> Result<&AmmPool> {
        match self {
            Self::Binary { pool } | Self::PseudoNumeric { pool, .. } | Self::Stonk { pool } => {
                Ok(pool)
            }
            Self::MultipleChoice { .. } => Err(OpenoddsError::InvalidRequest {
                reason: "multiple-choice contract has per-answer pools".into(),
            }),
        }
    }

    /// The pool for an answer of a multiple-choice contract.
    pub fn answer_pool(&self, answer_id: AnswerId) -> Result<&AmmPool> {
        match self {
            Self::MultipleChoice { answers, .. } => answers
                .iter()
                .find(|a| a.id == answer_id)
                .map(|a| &a.pool)
                .ok_or_else(|| OpenoddsError::InvalidRequest {
                    reason: format!("unknown answer {answer_id}"),
                }),
            _ => Err(OpenoddsError::InvalidRequest {
                reason: "contract has no answers".into(),
            }),
        }
    }

    /// Whether this shape participates in the cross-answer arbitrage solve.
    #[must_use]
    pub fn is_sum_to_one(&self) -> bool {
        matches!(
            self,
            Self::MultipleChoice {
                sum_to_one: true,
                ..
            }
        )
    }
}

/// A question: identity, creator (for fee routing), pool shape, and the
/// accrued liquidity subsidy (pool fee share plus unredeemed ante bonus)
/// paid out to LPs at resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub creator_id: UserId,
    pub kind: ContractKind,
    pub subsidy_pool: f64,
}

impl Contract {
    #[must_use]
    pub fn new(creator_id: UserId, kind: ContractKind) -> Self {
        Self {
            id: ContractId::new(),
            creator_id,
            kind,
            subsidy_pool: 0.0,
        }
    }
}
