//! Error taxonomy.
//!
//! Validation errors (`InvalidSetup`, `NotEligible`, `InvalidTarget`,
//! `WrongPhase`, `NotAdmin`, `UnknownPlayer`) are local: the command has no
//! effect and only the sender is told why. `Internal` marks a broken
//! invariant and ends the game instance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::PlayerId;
use crate::game::Phase;

/// Why an actor may not act right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ineligibility {
    /// The actor is dead and the command needs a living player.
    Dead,
    /// The actor's role has no night action.
    NoNightAbility,
    /// The actor already acted this phase.
    AlreadyActed,
    /// The actor already cast a ballot in this vote.
    AlreadyVoted,
    /// The ability only works on the first night.
    FirstNightOnly,
    /// The chosen potion has been used.
    PotionSpent,
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Dead => "player is dead",
            Self::NoNightAbility => "role has no night action",
            Self::AlreadyActed => "already acted this phase",
            Self::AlreadyVoted => "already voted",
            Self::FirstNightOnly => "ability only works on the first night",
            Self::PotionSpent => "potion already used",
        };
        f.write_str(text)
    }
}

/// Why a target was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRejection {
    /// No such player in this game.
    Unknown,
    /// The target is dead.
    Dead,
    /// The role may not target itself.
    SelfTarget,
    /// Both targets of a dual action are the same player.
    Duplicate,
    /// Bodyguard protected this player last night.
    RepeatProtection,
    /// The payload does not match the role's action shape.
    WrongShape,
}

impl std::fmt::Display for TargetRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Unknown => "no such player",
            Self::Dead => "target is dead",
            Self::SelfTarget => "cannot target yourself",
            Self::Duplicate => "targets must be different players",
            Self::RepeatProtection => "cannot protect the same player twice in a row",
            Self::WrongShape => "action does not fit this role",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid setup: {0}")]
    InvalidSetup(String),

    #[error("unknown role: {0}")]
    RoleNotFound(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("{player} may not act: {reason}")]
    NotEligible {
        player: PlayerId,
        reason: Ineligibility,
    },

    #[error("invalid target {target}: {reason}")]
    InvalidTarget {
        target: PlayerId,
        reason: TargetRejection,
    },

    #[error("command needs phase {expected:?}, game is in {actual:?}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("only the admin may do that")]
    NotAdmin,

    #[error("internal invariant broken: {0}")]
    Internal(String),

    #[error("no game with code {0}")]
    GameNotFound(String),

    #[error("game {0} is closed")]
    GameClosed(String),
}

impl GameError {
    /// True when the game instance must be ended.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    pub(crate) fn not_eligible(player: PlayerId, reason: Ineligibility) -> Self {
        Self::NotEligible { player, reason }
    }

    pub(crate) fn invalid_target(target: PlayerId, reason: TargetRejection) -> Self {
        Self::InvalidTarget { target, reason }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_internal_is_fatal() {
        assert!(GameError::Internal("lynch ballot missing".into()).is_fatal());
        assert!(!GameError::NotAdmin.is_fatal());
        assert!(!GameError::not_eligible(PlayerId(1), Ineligibility::Dead).is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = GameError::invalid_target(PlayerId(3), TargetRejection::SelfTarget);
        assert_eq!(err.to_string(), "invalid target Player 3: cannot target yourself");

        let err = GameError::not_eligible(PlayerId(0), Ineligibility::AlreadyActed);
        assert_eq!(err.to_string(), "Player 0 may not act: already acted this phase");
    }
}
