//! Error types for the OpenOdds engine.
//!
//! All errors use the `OD_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Request validation errors
//! - 2xx: Pool / liquidity errors
//! - 3xx: Order book errors
//! - 4xx: Arbitrage / invariant errors
//! - 9xx: General / internal errors
//!
//! Every error is fatal to the single requested operation: the engine never
//! applies a partial result beyond the deliberate partial fills it returns as
//! a *valid* result, and never retries internally.

use thiserror::Error;

use crate::OrderId;

/// Central error enum for all OpenOdds operations.
#[derive(Debug, Clone, Error)]
pub enum OpenoddsError {
    // =================================================================
    // Request Validation Errors (1xx)
    // =================================================================
    /// The bet or sale amount is non-positive or non-finite.
    #[error("OD_ERR_100: Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    /// A requested or resulting probability is outside legal bounds.
    #[error("OD_ERR_101: Probability out of bounds: {prob}")]
    ProbabilityOutOfBounds { prob: f64 },

    /// The request failed structural validation.
    #[error("OD_ERR_102: Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// A sale asked for more shares than the position holds.
    #[error("OD_ERR_103: Insufficient shares: need {needed}, have {held}")]
    InsufficientShares { needed: f64, held: f64 },

    // =================================================================
    // Pool / Liquidity Errors (2xx)
    // =================================================================
    /// The pool state itself is malformed (negative reserve, weight outside
    /// (0,1), non-finite field).
    #[error("OD_ERR_200: Malformed pool: {reason}")]
    MalformedPool { reason: String },

    /// The trade would push a pool reserve below the minimum floor.
    #[error("OD_ERR_201: Insufficient liquidity: reserve would fall to {would_be}")]
    InsufficientLiquidity { would_be: f64 },

    /// Burning more liquidity shares than exist.
    #[error("OD_ERR_202: Insufficient liquidity shares: need {needed}, have {available}")]
    InsufficientLiquidityShares { needed: f64, available: f64 },

    // =================================================================
    // Order Book Errors (3xx)
    // =================================================================
    /// The requested order was not found in the book snapshot.
    #[error("OD_ERR_300: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with this ID already exists in the book.
    #[error("OD_ERR_301: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The order on the snapshot is already filled, expired, or cancelled.
    #[error("OD_ERR_302: Stale order: {0}")]
    StaleOrder(OrderId),

    // =================================================================
    // Arbitrage / Invariant Errors (4xx)
    // =================================================================
    /// The cross-answer solve exceeded its iteration cap without converging.
    #[error("OD_ERR_400: Arbitrage solve failed: no convergence after {iterations} iterations (residual {residual})")]
    ArbitrageSolveFailed { iterations: usize, residual: f64 },

    /// The sum-to-one invariant was already violated on entry.
    #[error("OD_ERR_401: Inconsistent state: {reason}")]
    InconsistentState { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OD_ERR_900: Internal error: {0}")]
    Internal(String),
}

impl OpenoddsError {
    /// `true` for errors the end user can correct by changing the request
    /// (bad amount, stale order); `false` for internal invariant failures
    /// that should be surfaced to operators.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::ProbabilityOutOfBounds { .. }
                | Self::InvalidRequest { .. }
                | Self::InsufficientShares { .. }
                | Self::InsufficientLiquidity { .. }
                | Self::InsufficientLiquidityShares { .. }
                | Self::OrderNotFound(_)
                | Self::DuplicateOrder(_)
                | Self::StaleOrder(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenoddsError>;
