//! Role definitions: static role data.
//!
//! A `RoleDefinition` describes everything the resolvers need to know about
//! a role without naming it: its team, how the Seer sees it, the shape of
//! its night action, when that action resolves, and its solo win predicate.

use serde::{Deserialize, Serialize};

/// Resolution priority shared by every pack member.
pub const PACK_PRIORITY: u8 = 50;

/// Identifier for every role in the catalog.
///
/// Declaration order doubles as the catalog index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    Villager,
    Werewolf,
    AlphaWerewolf,
    ToughWerewolf,
    BacklashWerewolf,
    Seer,
    RandomSeer,
    Sorcerer,
    Bodyguard,
    Cupid,
    Witch,
    Monster,
    Fool,
    Honeypot,
    Hunter,
    Lawyer,
    Martyr,
    Mayor,
    Prostitute,
    Revealer,
    SerialKiller,
    ToughVillager,
    DementedVillager,
    WildChild,
}

impl RoleId {
    pub const ALL: [RoleId; 24] = [
        RoleId::Villager,
        RoleId::Werewolf,
        RoleId::AlphaWerewolf,
        RoleId::ToughWerewolf,
        RoleId::BacklashWerewolf,
        RoleId::Seer,
        RoleId::RandomSeer,
        RoleId::Sorcerer,
        RoleId::Bodyguard,
        RoleId::Cupid,
        RoleId::Witch,
        RoleId::Monster,
        RoleId::Fool,
        RoleId::Honeypot,
        RoleId::Hunter,
        RoleId::Lawyer,
        RoleId::Martyr,
        RoleId::Mayor,
        RoleId::Prostitute,
        RoleId::Revealer,
        RoleId::SerialKiller,
        RoleId::ToughVillager,
        RoleId::DementedVillager,
        RoleId::WildChild,
    ];

    /// Display name used by the lobby.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RoleId::Villager => "Villager",
            RoleId::Werewolf => "Werewolf",
            RoleId::AlphaWerewolf => "Alpha Werewolf",
            RoleId::ToughWerewolf => "Tough Werewolf",
            RoleId::BacklashWerewolf => "Backlash Werewolf",
            RoleId::Seer => "Seer",
            RoleId::RandomSeer => "Random Seer",
            RoleId::Sorcerer => "Sorcerer",
            RoleId::Bodyguard => "Bodyguard",
            RoleId::Cupid => "Cupid",
            RoleId::Witch => "Witch",
            RoleId::Monster => "Monster",
            RoleId::Fool => "Fool",
            RoleId::Honeypot => "Honeypot",
            RoleId::Hunter => "Hunter",
            RoleId::Lawyer => "Lawyer",
            RoleId::Martyr => "Martyr",
            RoleId::Mayor => "Mayor",
            RoleId::Prostitute => "Prostitute",
            RoleId::Revealer => "Revealer",
            RoleId::SerialKiller => "Serial Killer",
            RoleId::ToughVillager => "Tough Villager",
            RoleId::DementedVillager => "Demented Villager",
            RoleId::WildChild => "Wild Child",
        }
    }

    /// Catalog index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Team membership for team win conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Villagers,
    Werewolves,
    /// Belongs to neither main team.
    Solo,
}

/// How investigative roles see a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appearance {
    Villager,
    Werewolf,
}

impl Appearance {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Villager => Self::Werewolf,
            Self::Werewolf => Self::Villager,
        }
    }
}

/// Input shape a night action expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionShape {
    None,
    Single,
    Dual { second_optional: bool },
    Potion,
}

/// What a night action does when it resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightAbility {
    /// Block the visited player's action and share their fate tonight.
    Visit,
    /// Link two players as lovers.
    LinkLovers,
    /// Pick a role model; become a Werewolf when they die.
    RoleModel,
    /// Make the target immune to night attacks.
    Protect,
    /// Make the target immune to the next lynch.
    Defend,
    /// Give the target an extra life when the actor dies.
    Bequeath,
    /// Hit the target when the actor dies.
    Mark,
    /// Heal or poison.
    Brew,
    /// Vote on the pack's victim.
    PackKill,
    /// Kill alone.
    Kill,
    /// Kill a werewolf target, or die for accusing a villager.
    Reveal,
    /// Learn the target's appearance.
    Investigate,
    /// Investigate through a hidden sanity filter.
    InvestigateUnreliably,
    /// Learn whether the target holds a magic role.
    DetectMagic,
}

/// Solo win predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoloWin {
    /// Wins when lynched.
    Lynched,
    /// Wins after visiting more than half of the other players.
    VisitMajority,
    /// Wins when alive with at most one other living player.
    FinalTwo,
    /// Wins when the only living player.
    LastStanding,
    /// Wins when the only living player, once transformed.
    LastStandingTransformed,
}

/// Static role definition.
///
/// ## Example
///
/// ```
/// use werewolf_engine::roles::{RoleCatalog, RoleId, Team, ActionShape};
///
/// let seer = RoleCatalog::standard().get(RoleId::Seer);
/// assert_eq!(seer.team, Team::Villagers);
/// assert_eq!(seer.shape, ActionShape::Single);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub id: RoleId,
    pub name: &'static str,
    pub team: Team,

    /// Investigation result for the Seer.
    pub appears_as: Appearance,

    /// Night ability, if any.
    pub ability: Option<NightAbility>,

    /// Payload shape the ability accepts.
    pub shape: ActionShape,

    /// Resolution priority; lower resolves first.
    pub priority: u8,

    /// May target itself.
    pub allow_self: bool,

    /// Only usable on night one.
    pub first_night_only: bool,

    /// Extra lives at game start.
    pub extra_lives: u8,

    /// Hunts with the pack and counts toward pack consensus.
    pub pack_member: bool,

    /// Pack attacks have no effect.
    pub pack_immune: bool,

    /// Detected by the Sorcerer.
    pub magic: bool,

    pub solo_win: Option<SoloWin>,

    /// One-line rules summary for the lobby.
    pub summary: &'static str,
}

impl RoleDefinition {
    /// A role with no night action, on the Villager team.
    #[must_use]
    pub fn new(id: RoleId) -> Self {
        Self {
            id,
            name: id.name(),
            team: Team::Villagers,
            appears_as: Appearance::Villager,
            ability: None,
            shape: ActionShape::None,
            priority: u8::MAX,
            allow_self: false,
            first_night_only: false,
            extra_lives: 0,
            pack_member: false,
            pack_immune: false,
            magic: false,
            solo_win: None,
            summary: "",
        }
    }

    #[must_use]
    pub fn with_team(mut self, team: Team) -> Self {
        self.team = team;
        if team == Team::Werewolves {
            self.appears_as = Appearance::Werewolf;
        }
        self
    }

    #[must_use]
    pub fn appearing_as(mut self, appearance: Appearance) -> Self {
        self.appears_as = appearance;
        self
    }

    #[must_use]
    pub fn with_ability(mut self, ability: NightAbility, shape: ActionShape, priority: u8) -> Self {
        self.ability = Some(ability);
        self.shape = shape;
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn self_targetable(mut self) -> Self {
        self.allow_self = true;
        self
    }

    #[must_use]
    pub fn first_night_only(mut self) -> Self {
        self.first_night_only = true;
        self
    }

    #[must_use]
    pub fn with_extra_lives(mut self, lives: u8) -> Self {
        self.extra_lives = lives;
        self
    }

    /// Joins the pack: Werewolf team, pack kill at `PACK_PRIORITY`.
    #[must_use]
    pub fn in_pack(self, shape: ActionShape) -> Self {
        let mut def = self
            .with_team(Team::Werewolves)
            .with_ability(NightAbility::PackKill, shape, PACK_PRIORITY);
        def.pack_member = true;
        def
    }

    #[must_use]
    pub fn pack_immune(mut self) -> Self {
        self.pack_immune = true;
        self
    }

    #[must_use]
    pub fn magic(mut self) -> Self {
        self.magic = true;
        self
    }

    #[must_use]
    pub fn with_solo_win(mut self, win: SoloWin) -> Self {
        self.solo_win = Some(win);
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: &'static str) -> Self {
        self.summary = summary;
        self
    }

    /// Whether the role acts at night at all.
    #[must_use]
    pub fn has_night_action(&self) -> bool {
        self.ability.is_some()
    }
}
