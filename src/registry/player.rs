//! Per-player state.
//!
//! ## StatusFlags
//!
//! Transient and persistent markers packed into a bitset. Night markers
//! (`PROTECTED`, `HEALED`, `POISONED`, `BLOCKED`) and `ACTED` are cleared
//! at the start of every night, so `ACTED` still shows who acted during the
//! following day.
//!
//! ## DeathCause
//!
//! Every death records why it happened. The cause also decides whether an
//! extra life can absorb the hit: grief and visit links always kill.

use bitflags::bitflags;
use im::OrdSet;
use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::roles::{Appearance, RoleCatalog, RoleDefinition, RoleId, Team};

bitflags! {
    /// Status effects on a player.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StatusFlags: u16 {
        /// Bodyguard protection, tonight only.
        const PROTECTED = 1 << 0;
        /// Witch heal, tonight only.
        const HEALED = 1 << 1;
        /// Witch poison, tonight only.
        const POISONED = 1 << 2;
        /// Visited by the Prostitute; tonight's action is cancelled.
        const BLOCKED = 1 << 3;
        /// Lawyer's client; immune to the next lynch.
        const DEFENDED = 1 << 4;
        const ADMIN = 1 << 5;
        /// Submitted a night action since the last night began.
        const ACTED = 1 << 6;
        /// Wild Child turned Werewolf.
        const TRANSFORMED = 1 << 7;
        const HEAL_SPENT = 1 << 8;
        const POISON_SPENT = 1 << 9;

        const NIGHTLY = Self::PROTECTED.bits()
            | Self::HEALED.bits()
            | Self::POISONED.bits()
            | Self::BLOCKED.bits();
    }
}

/// Why a player died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Killed by the pack.
    PackAttack,
    /// Killed by the Serial Killer.
    SerialKiller,
    /// Witch poison.
    Poison,
    /// Exposed as a Werewolf by the Revealer.
    Revealed,
    /// Revealer who accused a villager.
    RevealBackfire,
    Lynch,
    /// Lover died.
    Heartbreak,
    /// Shared fate with the Prostitute's visit.
    VisitLink,
    /// Killed the Honeypot.
    HoneypotTrap,
    /// Hunter's dying shot.
    HunterArrow,
    /// Backlash Werewolf's dying strike.
    BacklashStrike,
}

impl DeathCause {
    /// Whether an extra life can absorb this hit.
    #[must_use]
    pub fn absorbable(self) -> bool {
        !matches!(self, Self::Heartbreak | Self::VisitLink)
    }

    /// Public wording for the night or lynch report.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::PackAttack => "was killed by the Werewolves",
            Self::SerialKiller => "was killed by the Serial Killer",
            Self::Poison => "was poisoned",
            Self::Revealed => "was revealed as a Werewolf",
            Self::RevealBackfire => "died accusing an innocent",
            Self::Lynch => "was lynched by the village",
            Self::Heartbreak => "died of a broken heart",
            Self::VisitLink => "shared the fate of a night visit",
            Self::HoneypotTrap => "fell into the Honeypot's trap",
            Self::HunterArrow => "was shot by the Hunter",
            Self::BacklashStrike => "was struck down by a dying Werewolf",
        }
    }
}

/// Result of `PlayerRegistry::kill`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillOutcome {
    Died,
    /// An extra life absorbed the hit.
    LifeConsumed,
    AlreadyDead,
}

/// Hidden mental state of a Random Seer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sanity {
    Sane,
    /// Sees werewolves everywhere.
    Paranoid,
    /// Sees only villagers.
    Naive,
    /// Sees the opposite.
    Insane,
}

impl Sanity {
    pub const ALL: [Sanity; 4] = [Sanity::Sane, Sanity::Paranoid, Sanity::Naive, Sanity::Insane];

    /// Filter a true appearance through this sanity.
    #[must_use]
    pub fn perceive(self, truth: Appearance) -> Appearance {
        match self {
            Self::Sane => truth,
            Self::Paranoid => Appearance::Werewolf,
            Self::Naive => Appearance::Villager,
            Self::Insane => truth.flipped(),
        }
    }
}

/// A seated player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Current role. Changes only on transformation.
    pub role: RoleId,
    /// Role dealt at game start.
    pub original_role: RoleId,
    pub alive: bool,
    pub flags: StatusFlags,
    /// Lethal hits this player can still absorb.
    pub extra_lives: u8,
    pub lover: Option<PlayerId>,
    /// Wild Child's role model.
    pub role_model: Option<PlayerId>,
    /// Hunter or Backlash Werewolf target for the dying shot.
    pub mark: Option<PlayerId>,
    /// Martyr's beneficiary.
    pub bequest: Option<PlayerId>,
    /// Bodyguard's previous protectee.
    pub last_protected: Option<PlayerId>,
    /// Distinct players visited by the Prostitute.
    pub visited: OrdSet<PlayerId>,
    pub sanity: Option<Sanity>,
    pub death: Option<DeathCause>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, role: RoleId) -> Self {
        let def = RoleCatalog::standard().get(role);
        Self {
            id,
            name: name.into(),
            role,
            original_role: role,
            alive: true,
            flags: StatusFlags::empty(),
            extra_lives: def.extra_lives,
            lover: None,
            role_model: None,
            mark: None,
            bequest: None,
            last_protected: None,
            visited: OrdSet::new(),
            sanity: None,
            death: None,
        }
    }

    /// Catalog entry for the current role.
    #[must_use]
    pub fn definition(&self) -> &'static RoleDefinition {
        RoleCatalog::standard().get(self.role)
    }

    #[must_use]
    pub fn team(&self) -> Team {
        self.definition().team
    }

    #[must_use]
    pub fn has(&self, flag: StatusFlags) -> bool {
        self.flags.contains(flag)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has(StatusFlags::ADMIN)
    }

    /// Hunts with the pack.
    #[must_use]
    pub fn in_pack(&self) -> bool {
        self.definition().pack_member
    }

    #[must_use]
    pub fn is_werewolf_team(&self) -> bool {
        self.team() == Team::Werewolves
    }
}
