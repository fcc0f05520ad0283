//! # openodds-fillcore
//!
//! **The fill engine: limit order book, pool matching, arbitrage solve.**
//!
//! Everything here is a pure function over snapshots. The caller owns
//! persistence, balances, and the clock; the engine owns price priority,
//! fill math, and the sum-to-one invariant. Identical inputs always
//! produce identical outputs, fill IDs included.
//!
//! ## Matching model
//!
//! An incoming request trades against two sources of liquidity at once:
//! resting limit orders on the opposite side of the book, and the CPMM
//! pool. Each step fills against whichever quotes the better price, with
//! pool fills bounded so they never trade through a resting maker.

pub mod arbitrage;
pub mod matcher;
pub mod orderbook;
pub mod price_level;

pub use arbitrage::{AnswerPurchase, SolveStatus, buy_answer, check_sum_to_one};
pub use matcher::{FillOutput, fill_batch, fill_request};
pub use orderbook::OrderBook;
pub use price_level::PriceLevel;
