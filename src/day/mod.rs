//! Day phase: accusations, the end-day quorum and the lynch vote.
//!
//! - `AccusationBoard`: one accusation per voter, majority lock-in,
//!   plurality close with a Mayor tie-break, one restart after a tie
//! - `LynchBallot`: yes/no ballots, missing ballots count as no, the Mayor
//!   breaks a level vote
//!
//! Dead players vote only when ghost mode is on.

mod accusation;
mod lynch;

pub use accusation::{electorate, majority, AccusationBoard, AccusationClose, AccusationOutcome};
pub use lynch::{LynchBallot, LynchTally};
