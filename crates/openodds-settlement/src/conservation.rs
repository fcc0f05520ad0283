//! Value conservation check.
//!
//! Every unit paid out at resolution must have entered the system as a
//! bet stake or a liquidity contribution. The engine's math guarantees
//! this analytically; this check verifies it numerically over the actual
//! recorded history, catching double-counted fills, mispriced pool math,
//! or corrupted records before payouts are committed.

use openodds_types::{Bet, LiquidityProvision, OpenoddsError, Payout, Result};

/// Relative slack allowed for accumulated floating-point drift.
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Inflow/outflow totals for one resolved contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConservationReport {
    /// Bet stakes plus liquidity additions.
    pub inflow: f64,
    /// Payouts plus liquidity withdrawals.
    pub outflow: f64,
    /// `inflow - outflow`; non-negative when conservation holds. Positive
    /// slack is normal: platform and creator fee shares leave the system
    /// without appearing in payouts.
    pub slack: f64,
}

/// Verify that payouts never exceed what entered the system.
///
/// Errors with `InconsistentState` when the outflow exceeds the inflow by
/// more than floating-point tolerance.
pub fn check_conservation(
    bets: &[Bet],
    provisions: &[LiquidityProvision],
    payouts: &[Payout],
) -> Result<ConservationReport> {
    let mut inflow: f64 = bets.iter().map(|b| b.amount).sum();
    let mut outflow: f64 = payouts.iter().map(|p| p.amount).sum();
    for provision in provisions {
        let signed = provision.signed_amount();
        if signed >= 0.0 {
            inflow += signed;
        } else {
            outflow -= signed;
        }
    }

    let slack = inflow - outflow;
    let tolerance = RELATIVE_TOLERANCE * inflow.max(1.0);
    if slack < -tolerance {
        tracing::error!(inflow, outflow, slack, "value conservation violated");
        return Err(OpenoddsError::InconsistentState {
            reason: format!(
                "payouts exceed inflows: in {inflow:.9}, out {outflow:.9}"
            ),
        });
    }

    tracing::debug!(inflow, outflow, slack, "conservation check passed");
    Ok(ConservationReport {
        inflow,
        outflow,
        slack,
    })
}
