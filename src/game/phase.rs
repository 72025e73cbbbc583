//! Top-level game phases.

use serde::{Deserialize, Serialize};

use crate::core::TimedPhase;

/// Where the game is in its cycle.
///
/// `Lobby -> Night -> Accusation -> LynchVote -> Night ...`, with
/// `GameOver` reachable from any resolution and `Lobby` again after a
/// rematch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Lobby,
    Night,
    Accusation,
    LynchVote,
    GameOver,
}

impl Phase {
    /// The countdown slot for this phase, if it can be timed.
    #[must_use]
    pub fn timed(self) -> Option<TimedPhase> {
        match self {
            Self::Night => Some(TimedPhase::Night),
            Self::Accusation => Some(TimedPhase::Accusation),
            Self::LynchVote => Some(TimedPhase::LynchVote),
            Self::Lobby | Self::GameOver => None,
        }
    }

    #[must_use]
    pub fn is_day(self) -> bool {
        matches!(self, Self::Accusation | Self::LynchVote)
    }

    /// A game is running: roles are dealt and no winner yet.
    #[must_use]
    pub fn in_progress(self) -> bool {
        matches!(self, Self::Night | Self::Accusation | Self::LynchVote)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lobby => "lobby",
            Self::Night => "night",
            Self::Accusation => "accusation",
            Self::LynchVote => "lynch_vote",
            Self::GameOver => "game_over",
        };
        f.write_str(name)
    }
}
