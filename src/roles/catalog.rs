//! The role catalog.
//!
//! Built once per process and shared read-only by every game. Lookups by
//! `RoleId` are infallible; lookups by name fail with `RoleNotFound`.

use rustc_hash::FxHashMap;
use std::sync::OnceLock;

use super::definition::{ActionShape, Appearance, NightAbility, RoleDefinition, RoleId, SoloWin, Team};
use crate::error::{GameError, Result};

/// Registry of role definitions.
#[derive(Clone, Debug)]
pub struct RoleCatalog {
    /// Indexed by `RoleId::index`.
    roles: Vec<RoleDefinition>,
    by_name: FxHashMap<String, RoleId>,
}

static STANDARD: OnceLock<RoleCatalog> = OnceLock::new();

/// Normalize a role name for lookup: lowercase, separators collapsed.
fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn define(id: RoleId) -> RoleDefinition {
    use ActionShape::{Dual, Potion, Single};
    use NightAbility as A;

    let base = RoleDefinition::new(id);
    match id {
        RoleId::Villager => base.with_summary("Find the Werewolves and vote them out."),
        RoleId::Werewolf => base
            .in_pack(Single)
            .with_summary("Agree with the pack on a victim each night."),
        RoleId::AlphaWerewolf => base
            .in_pack(Single)
            .with_solo_win(SoloWin::LastStanding)
            .with_summary("Hunts with the pack; wins alone if last one standing."),
        RoleId::ToughWerewolf => base
            .in_pack(Single)
            .with_extra_lives(1)
            .with_summary("A Werewolf that survives the first lethal hit."),
        RoleId::BacklashWerewolf => base
            .in_pack(Dual { second_optional: true })
            .with_summary("Hunts with the pack and marks a player to strike on death."),
        RoleId::Seer => base
            .with_ability(A::Investigate, Single, 90)
            .magic()
            .with_summary("Learn whether a player is a Werewolf."),
        RoleId::RandomSeer => base
            .with_ability(A::InvestigateUnreliably, Single, 91)
            .magic()
            .with_summary("A Seer whose sanity is a secret."),
        RoleId::Sorcerer => base
            .with_team(Team::Werewolves)
            .appearing_as(Appearance::Villager)
            .with_ability(A::DetectMagic, Single, 92)
            .with_summary("The Werewolves' Seer; looks for magic roles."),
        RoleId::Bodyguard => base
            .with_ability(A::Protect, Single, 10)
            .self_targetable()
            .with_summary("Protect a player from night attacks, never twice in a row."),
        RoleId::Cupid => base
            .with_ability(A::LinkLovers, Dual { second_optional: false }, 5)
            .self_targetable()
            .first_night_only()
            .magic()
            .with_summary("Link two lovers on the first night."),
        RoleId::Witch => base
            .with_ability(A::Brew, Potion, 20)
            .self_targetable()
            .magic()
            .with_summary("One healing and one poison potion per game."),
        RoleId::Monster => base
            .with_team(Team::Solo)
            .appearing_as(Appearance::Werewolf)
            .pack_immune()
            .with_solo_win(SoloWin::FinalTwo)
            .with_summary("Immune to the pack, seen as a Werewolf."),
        RoleId::Fool => base
            .with_team(Team::Solo)
            .with_solo_win(SoloWin::Lynched)
            .with_summary("Win by getting yourself lynched."),
        RoleId::Honeypot => base.with_summary("Whoever kills you dies with you."),
        RoleId::Hunter => base
            .with_ability(A::Mark, Single, 13)
            .with_summary("Mark a player to shoot when you die."),
        RoleId::Lawyer => base
            .with_ability(A::Defend, Single, 11)
            .with_summary("Your client cannot be lynched the next day."),
        RoleId::Martyr => base
            .with_ability(A::Bequeath, Single, 12)
            .with_summary("Your chosen player gains a life when you die."),
        RoleId::Mayor => base.with_summary("Your vote breaks ties."),
        RoleId::Prostitute => base
            .with_ability(A::Visit, Single, 0)
            .with_solo_win(SoloWin::VisitMajority)
            .with_summary("Block a player's night action; share their fate tonight."),
        RoleId::Revealer => base
            .with_ability(A::Reveal, Single, 60)
            .magic()
            .with_summary("Reveal a Werewolf to kill it, or die if wrong."),
        RoleId::SerialKiller => base
            .with_team(Team::Solo)
            .with_ability(A::Kill, Single, 55)
            .with_solo_win(SoloWin::FinalTwo)
            .with_summary("Kill one player each night; win when nearly alone."),
        RoleId::ToughVillager => base
            .with_extra_lives(1)
            .with_summary("Survive the first lethal hit."),
        RoleId::DementedVillager => base
            .with_solo_win(SoloWin::LastStanding)
            .with_summary("Seen as a Villager; wins alone if last one standing."),
        RoleId::WildChild => base
            .with_ability(A::RoleModel, Single, 6)
            .first_night_only()
            .with_solo_win(SoloWin::LastStandingTransformed)
            .with_summary("Pick a role model; become a Werewolf when they die."),
    }
}

impl RoleCatalog {
    /// Build the full catalog.
    #[must_use]
    pub fn new() -> Self {
        let roles: Vec<RoleDefinition> = RoleId::ALL.iter().map(|&id| define(id)).collect();
        let by_name = RoleId::ALL
            .iter()
            .map(|&id| (name_key(id.name()), id))
            .collect();
        Self { roles, by_name }
    }

    /// The process-wide catalog.
    pub fn standard() -> &'static RoleCatalog {
        STANDARD.get_or_init(RoleCatalog::new)
    }

    /// Get a role definition by id.
    #[must_use]
    pub fn get(&self, id: RoleId) -> &RoleDefinition {
        &self.roles[id.index()]
    }

    /// Look up a role by display name.
    ///
    /// Case, spaces, underscores and hyphens are ignored, so
    /// `"Serial Killer"` and `"serial_killer"` both resolve.
    pub fn get_role(&self, name: &str) -> Result<&RoleDefinition> {
        self.resolve(name).map(|id| self.get(id))
    }

    /// Resolve a name to a role id.
    pub fn resolve(&self, name: &str) -> Result<RoleId> {
        self.by_name
            .get(&name_key(name))
            .copied()
            .ok_or_else(|| GameError::RoleNotFound(name.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.iter()
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimum number of pack werewolves recommended for a roster size.
#[must_use]
pub fn recommended_werewolves(players: usize) -> usize {
    match players {
        0..=6 => 1,
        7..=8 => 2,
        9..=11 => 3,
        12..=16 => 4,
        n => n / 4,
    }
}
