//! The two tradeable outcomes of a binary pool.

use serde::{Deserialize, Serialize};

/// Which outcome a bet or resting order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// The other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    /// Price of one share of this outcome at YES-probability `prob`.
    #[must_use]
    pub fn share_price(self, prob: f64) -> f64 {
        match self {
            Self::Yes => prob,
            Self::No => 1.0 - prob,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_flips() {
        assert_eq!(Outcome::Yes.opposite(), Outcome::No);
        assert_eq!(Outcome::No.opposite(), Outcome::Yes);
    }

    #[test]
    fn share_price_complements() {
        let prob = 0.42;
        assert!((Outcome::Yes.share_price(prob) + Outcome::No.share_price(prob) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Outcome::Yes), "YES");
        assert_eq!(format!("{}", Outcome::No), "NO");
    }
}
