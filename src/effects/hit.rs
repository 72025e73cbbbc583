//! Hits: a pending attempt to kill one player.
//!
//! A hit carries its cause and who is responsible for it. The cause decides
//! which shields apply; the source decides whether a Honeypot can strike
//! back.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::registry::{DeathCause, Player, StatusFlags};

/// Who is responsible for a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "player", rename_all = "snake_case")]
pub enum HitSource {
    /// The pack as a whole. Untraceable.
    Pack,
    /// The lynch mob. Untraceable.
    Mob,
    /// One identifiable player.
    Actor(PlayerId),
    /// A consequence of another death (grief, visit link).
    Cascade,
}

impl HitSource {
    /// The single responsible player, if there is one.
    #[must_use]
    pub fn actor(self) -> Option<PlayerId> {
        match self {
            Self::Actor(id) => Some(id),
            _ => None,
        }
    }
}

/// What stopped a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shield {
    /// Bodyguard.
    Protected,
    /// Witch heal.
    Healed,
    /// Monster versus the pack.
    Immune,
    /// Lawyer's client versus the mob.
    Defended,
    /// An extra life was spent.
    ExtraLife,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub target: PlayerId,
    pub cause: DeathCause,
    pub source: HitSource,
}

impl Hit {
    #[must_use]
    pub fn new(target: PlayerId, cause: DeathCause, source: HitSource) -> Self {
        Self {
            target,
            cause,
            source,
        }
    }

    /// Night attacks are stopped by protection and heals.
    #[must_use]
    pub fn is_night_attack(&self) -> bool {
        matches!(
            self.cause,
            DeathCause::PackAttack
                | DeathCause::SerialKiller
                | DeathCause::Poison
                | DeathCause::Revealed
                | DeathCause::RevealBackfire
        )
    }

    /// The shield, if any, that stops this hit on `target` before lives are
    /// considered.
    #[must_use]
    pub fn blocked_by(&self, target: &Player) -> Option<Shield> {
        if self.is_night_attack() {
            if target.has(StatusFlags::PROTECTED) {
                return Some(Shield::Protected);
            }
            if target.has(StatusFlags::HEALED) {
                return Some(Shield::Healed);
            }
            if self.cause == DeathCause::PackAttack && target.definition().pack_immune {
                return Some(Shield::Immune);
            }
        }
        if self.cause == DeathCause::Lynch && target.has(StatusFlags::DEFENDED) {
            return Some(Shield::Defended);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::RoleId;

    #[test]
    fn test_protection_stops_attacks_only() {
        let mut guarded = Player::new(PlayerId(1), "G", RoleId::Villager);
        guarded.flags.insert(StatusFlags::PROTECTED);

        let bite = Hit::new(guarded.id, DeathCause::PackAttack, HitSource::Pack);
        let arrow = Hit::new(guarded.id, DeathCause::HunterArrow, HitSource::Actor(PlayerId(4)));

        assert_eq!(bite.blocked_by(&guarded), Some(Shield::Protected));
        assert_eq!(arrow.blocked_by(&guarded), None);
    }

    #[test]
    fn test_monster_immune_to_pack_only() {
        let monster = Player::new(PlayerId(2), "M", RoleId::Monster);
        let bite = Hit::new(monster.id, DeathCause::PackAttack, HitSource::Pack);
        let stab = Hit::new(monster.id, DeathCause::SerialKiller, HitSource::Actor(PlayerId(0)));

        assert_eq!(bite.blocked_by(&monster), Some(Shield::Immune));
        assert_eq!(stab.blocked_by(&monster), None);
    }

    #[test]
    fn test_defended_client_survives_lynch() {
        let mut client = Player::new(PlayerId(3), "C", RoleId::Villager);
        client.flags.insert(StatusFlags::DEFENDED);
        let rope = Hit::new(client.id, DeathCause::Lynch, HitSource::Mob);
        assert_eq!(rope.blocked_by(&client), Some(Shield::Defended));
    }

    #[test]
    fn test_source_actor() {
        assert_eq!(HitSource::Actor(PlayerId(5)).actor(), Some(PlayerId(5)));
        assert_eq!(HitSource::Pack.actor(), None);
        assert_eq!(HitSource::Mob.actor(), None);
    }
}
