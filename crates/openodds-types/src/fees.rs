//! Fee totals and their deterministic split.

use serde::{Deserialize, Serialize};

use crate::ContractKind;
use crate::constants::{CREATOR_FEE_SHARE, PLATFORM_FEE_SHARE, POOL_FEE_SHARE};

/// A taker fee broken out by recipient.
///
/// The pool share accrues to the contract's subsidy pool (paid to LPs at
/// resolution) rather than to the reserves, so fees never perturb the
/// constant-product invariant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Fees {
    pub platform: f64,
    pub creator: f64,
    pub pool: f64,
}

impl Fees {
    pub const ZERO: Self = Self {
        platform: 0.0,
        creator: 0.0,
        pool: 0.0,
    };

    #[must_use]
    pub fn total(&self) -> f64 {
        self.platform + self.creator + self.pool
    }
}

impl std::ops::Add for Fees {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            platform: self.platform + rhs.platform,
            creator: self.creator + rhs.creator,
            pool: self.pool + rhs.pool,
        }
    }
}

impl std::iter::Sum for Fees {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, std::ops::Add::add)
    }
}

/// Split a fee total among platform, creator, and pool.
///
/// Pure function of `(fee_total, kind)`. Stonks carry no creator share —
/// they never resolve, so the whole non-platform portion subsidizes the
/// pool.
#[must_use]
pub fn split_fee(fee_total: f64, kind: &ContractKind) -> Fees {
    match kind {
        ContractKind::Stonk { .. } => Fees {
            platform: fee_total * PLATFORM_FEE_SHARE,
            creator: 0.0,
            pool: fee_total * (CREATOR_FEE_SHARE + POOL_FEE_SHARE),
        },
        _ => Fees {
            platform: fee_total * PLATFORM_FEE_SHARE,
            creator: fee_total * CREATOR_FEE_SHARE,
            pool: fee_total * POOL_FEE_SHARE,
        },
    }
}
