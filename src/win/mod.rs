//! Win evaluator.
//!
//! Run after every resolution that can change who is alive. Returns no
//! winner, or the winning team or solo role with a reason and every
//! player's final state.

mod evaluator;

pub use evaluator::{evaluate, Evaluation, FinalPlayer, Winner, WinResult, WinRules, SOLO_PRECEDENCE};
