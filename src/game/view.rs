//! Per-player snapshots.
//!
//! A `PlayerView` is what one player is allowed to know right now: their
//! own role, which seats are alive, roles revealed by death (or shared by
//! the pack), the night prompt for their role, accusation counts and the
//! current countdown. It is rebuilt from scratch for every sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::core::{GameMode, GameRng, PlayerId, PlayerTag};
use crate::roles::{ActionShape, NightAbility, RoleId, Team};
use crate::win::WinResult;

/// Questions shown in pass-and-play to players without a night action, so
/// every turn at the device looks alike.
pub const FLAVOUR_PROMPTS: [&str; 5] = [
    "Who has the cutest smile?",
    "Who would die first in a zombie apocalypse?",
    "Who is the most lightweight drinker?",
    "Who looks the most suspicious right now?",
    "Who is a finger licker?",
];

/// Flavour prompt for a seat on a given night.
///
/// Drawn from a per-night, per-seat stream of `prompts`, so every sync in
/// the same night shows the same question.
#[must_use]
pub fn flavour_prompt(prompts: &GameRng, night: u32, player: PlayerId) -> &'static str {
    let mut rng = prompts.for_context(&format!("{night}/{}", player.index()));
    FLAVOUR_PROMPTS[rng.gen_range_usize(0..FLAVOUR_PROMPTS.len())]
}

/// Prompt text for a night ability.
#[must_use]
pub fn ability_prompt(ability: NightAbility) -> &'static str {
    match ability {
        NightAbility::Visit => "Who will you visit tonight?",
        NightAbility::LinkLovers => "Choose two players to fall in love",
        NightAbility::RoleModel => "Choose your role model",
        NightAbility::Protect => "Who will you protect tonight?",
        NightAbility::Defend => "Who will you defend tomorrow?",
        NightAbility::Bequeath => "Who inherits your extra life?",
        NightAbility::Mark => "Who will you take down with you?",
        NightAbility::Brew => "Heal or poison someone?",
        NightAbility::PackKill => "Who will the pack hunt tonight?",
        NightAbility::Kill => "Who will you kill tonight?",
        NightAbility::Reveal => "Whose true nature will you expose?",
        NightAbility::Investigate | NightAbility::InvestigateUnreliably => {
            "Whose role will you see?"
        }
        NightAbility::DetectMagic => "Who will you sense for magic?",
    }
}

/// The viewer's own seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfView {
    pub id: PlayerId,
    pub name: String,
    /// `None` until roles are dealt.
    pub role: Option<RoleId>,
    pub role_name: Option<String>,
    pub summary: Option<String>,
    pub team: Option<Team>,
    pub alive: bool,
    pub admin: bool,
    pub lover: Option<PlayerId>,
}

/// Another seat as seen by the viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub alive: bool,
    /// Known to the viewer: their own, the dead, fellow pack members, and
    /// everyone once the game is over.
    pub role: Option<RoleId>,
}

/// What the viewer's night screen should offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightPrompt {
    pub ability: Option<NightAbility>,
    pub shape: ActionShape,
    pub prompt: String,
    pub choices: Vec<PlayerTag>,
    pub submitted: bool,
    /// Pass-and-play stand-in for a role with no action; submit `skip`.
    pub decoy: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub code: String,
    pub phase: Phase,
    /// Night number, or the day that follows it.
    pub round: u32,
    pub mode: GameMode,
    pub you: Option<SelfView>,
    pub players: Vec<SeatView>,
    pub living: Vec<PlayerId>,
    pub night: Option<NightPrompt>,
    /// (target, accusations) sorted by count.
    pub accusations: Vec<(PlayerId, usize)>,
    pub accused: Option<PlayerId>,
    pub timer_ends_at: Option<DateTime<Utc>>,
    pub timers_disabled: bool,
    pub lobby_roles: Vec<RoleId>,
    pub result: Option<WinResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavour_prompt_is_seeded() {
        let prompts = GameRng::new(42).for_context("prompts");
        let again = GameRng::new(42).for_context("prompts");
        for night in 1..=5 {
            assert_eq!(
                flavour_prompt(&prompts, night, PlayerId(3)),
                flavour_prompt(&again, night, PlayerId(3))
            );
        }

        let nights: Vec<_> = (1..=20).map(|n| flavour_prompt(&prompts, n, PlayerId(0))).collect();
        assert!(nights.iter().any(|q| *q != nights[0]));
        assert!(nights.iter().all(|q| FLAVOUR_PROMPTS.contains(q)));
    }
}
