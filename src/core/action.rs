//! Night action and ballot payloads.
//!
//! A night action is a tagged payload: the variant says what shape of input
//! the actor supplied, and the role catalog says which shape each role
//! expects. Validation compares the two instead of branching on role names.
//!
//! ```
//! use werewolf_engine::core::{ActionPayload, PlayerId, Potion};
//!
//! let kill = ActionPayload::single(PlayerId::new(3));
//! let heal = ActionPayload::potion(Potion::Heal, PlayerId::new(1));
//! assert_eq!(kill.targets().as_slice(), &[PlayerId::new(3)]);
//! assert!(!heal.is_skip());
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::player::PlayerId;

/// Witch potions. Each may be used once per game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Potion {
    Heal,
    Poison,
}

/// What a player submitted for the night.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionPayload {
    /// Nobody. Always legal, never has an effect.
    Skip,
    /// One target.
    Single { target: PlayerId },
    /// Two targets. The second may be omitted when the role allows it
    /// (Backlash Werewolf's revenge mark).
    Dual {
        first: PlayerId,
        second: Option<PlayerId>,
    },
    /// A potion and its target.
    Potion { potion: Potion, target: PlayerId },
}

impl ActionPayload {
    #[must_use]
    pub fn single(target: PlayerId) -> Self {
        Self::Single { target }
    }

    #[must_use]
    pub fn dual(first: PlayerId, second: PlayerId) -> Self {
        Self::Dual {
            first,
            second: Some(second),
        }
    }

    #[must_use]
    pub fn potion(potion: Potion, target: PlayerId) -> Self {
        Self::Potion { potion, target }
    }

    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    /// The first (or only) target.
    #[must_use]
    pub fn primary(&self) -> Option<PlayerId> {
        match *self {
            Self::Skip => None,
            Self::Single { target } | Self::Potion { target, .. } => Some(target),
            Self::Dual { first, .. } => Some(first),
        }
    }

    /// Every player named by this payload, in submission order.
    #[must_use]
    pub fn targets(&self) -> SmallVec<[PlayerId; 2]> {
        let mut out = SmallVec::new();
        match *self {
            Self::Skip => {}
            Self::Single { target } | Self::Potion { target, .. } => out.push(target),
            Self::Dual { first, second } => {
                out.push(first);
                if let Some(second) = second {
                    out.push(second);
                }
            }
        }
        out
    }
}

/// A submitted night action, keyed by actor in the collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightAction {
    pub actor: PlayerId,
    pub payload: ActionPayload,
}

impl NightAction {
    #[must_use]
    pub fn new(actor: PlayerId, payload: ActionPayload) -> Self {
        Self { actor, payload }
    }
}

/// A lynch ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ballot {
    Yes,
    No,
}
