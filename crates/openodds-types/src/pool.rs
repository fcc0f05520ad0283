//! The weighted constant-product pool backing every tradeable question.
//!
//! Invariant: `yes^p * no^(1-p) = k`, constant across any trade net of fees
//! and liquidity changes. The engine never mutates a pool in place — every
//! operation returns a fresh value and the caller owns persistence.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_CPMM_PROB, MIN_CPMM_PROB, MIN_POOL_SHARES};
use crate::{OpenoddsError, Outcome, Result};

/// One weighted constant-product market-maker pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmmPool {
    /// YES share reserve.
    pub yes_shares: f64,
    /// NO share reserve.
    pub no_shares: f64,
    /// Pool weight `p ∈ (0,1)`; `0.5` is a plain constant product.
    pub p: f64,
    /// Total liquidity shares outstanding across all providers.
    pub total_liquidity_shares: f64,
}

impl AmmPool {
    /// Seed a fresh pool from ante liquidity at an initial probability.
    ///
    /// The ante becomes both reserves; the weight is chosen so the pool
    /// opens at `initial_prob`.
    pub fn seed(ante: f64, initial_prob: f64) -> Result<Self> {
        if !(ante.is_finite() && ante > 0.0) {
            return Err(OpenoddsError::InvalidAmount { amount: ante });
        }
        if !(MIN_CPMM_PROB..=MAX_CPMM_PROB).contains(&initial_prob) {
            return Err(OpenoddsError::ProbabilityOutOfBounds { prob: initial_prob });
        }
        // With equal reserves, prob = p, so the weight is the opening prob.
        let pool = Self {
            yes_shares: ante,
            no_shares: ante,
            p: initial_prob,
            total_liquidity_shares: ante,
        };
        pool.validate()?;
        Ok(pool)
    }

    /// Marginal YES probability: `p*no / (p*no + (1-p)*yes)`.
    ///
    /// Strictly inside `(0,1)` for any valid pool.
    #[must_use]
    pub fn probability(&self) -> f64 {
        let weighted_no = self.p * self.no_shares;
        weighted_no / (weighted_no + (1.0 - self.p) * self.yes_shares)
    }

    /// The constant-product invariant value `yes^p * no^(1-p)`.
    #[must_use]
    pub fn invariant_k(&self) -> f64 {
        self.yes_shares.powf(self.p) * self.no_shares.powf(1.0 - self.p)
    }

    /// Reserve on the given side.
    #[must_use]
    pub fn reserve(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Yes => self.yes_shares,
            Outcome::No => self.no_shares,
        }
    }

    /// A copy with the given side's reserve replaced.
    #[must_use]
    pub fn with_reserve(&self, outcome: Outcome, shares: f64) -> Self {
        let mut pool = *self;
        match outcome {
            Outcome::Yes => pool.yes_shares = shares,
            Outcome::No => pool.no_shares = shares,
        }
        pool
    }

    /// Structural validation: finite fields, positive reserves above the
    /// floor, weight strictly inside `(0,1)`.
    pub fn validate(&self) -> Result<()> {
        if !(self.yes_shares.is_finite()
            && self.no_shares.is_finite()
            && self.p.is_finite()
            && self.total_liquidity_shares.is_finite())
        {
            return Err(OpenoddsError::MalformedPool {
                reason: "non-finite field".into(),
            });
        }
        if self.p <= 0.0 || self.p >= 1.0 {
            return Err(OpenoddsError::MalformedPool {
                reason: format!("weight {} outside (0,1)", self.p),
            });
        }
        if self.yes_shares < MIN_POOL_SHARES || self.no_shares < MIN_POOL_SHARES {
            return Err(OpenoddsError::InsufficientLiquidity {
                would_be: self.yes_shares.min(self.no_shares),
            });
        }
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl AmmPool {
    /// A symmetric pool at probability `p` with equal reserves.
    #[must_use]
    pub fn dummy(yes: f64, no: f64, p: f64) -> Self {
        Self {
            yes_shares: yes,
            no_shares: no,
            p,
            total_liquidity_shares: yes.min(no),
        }
    }
}
