//! Win evaluation.
//!
//! A pure function of the registry. Solo predicates are checked first, in a
//! fixed precedence order; the first one satisfied wins the round. Team
//! conditions follow:
//!
//! - the Werewolves win once no living player outside their team remains
//!   (the Monster does not count)
//! - the Villagers win once no living Werewolf-team player remains and no
//!   Serial Killer is still alive
//!
//! The two team conditions cannot hold together: one needs a living
//! Werewolf-team player, the other needs none. A table with nobody left
//! alive therefore goes to the Villagers.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::registry::{DeathCause, Player, PlayerRegistry, StatusFlags};
use crate::roles::{RoleCatalog, RoleId, SoloWin, Team};

/// Solo roles in the order their predicates are checked.
pub const SOLO_PRECEDENCE: [RoleId; 7] = [
    RoleId::Fool,
    RoleId::Prostitute,
    RoleId::SerialKiller,
    RoleId::Monster,
    RoleId::AlphaWerewolf,
    RoleId::DementedVillager,
    RoleId::WildChild,
];

/// Who won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Winner {
    Team { team: Team },
    Solo { player: PlayerId, role: RoleId },
}

/// A player's end-of-game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPlayer {
    pub id: PlayerId,
    pub name: String,
    pub role: RoleId,
    pub original_role: RoleId,
    pub alive: bool,
}

impl From<&Player> for FinalPlayer {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            role: p.role,
            original_role: p.original_role,
            alive: p.alive,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinResult {
    pub winner: Winner,
    pub reason: String,
    pub final_players: Vec<FinalPlayer>,
}

/// Rule switches that shape evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WinRules {
    pub solo_win_continues: bool,
    pub wolves_win_on_parity: bool,
}

/// Output of one evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Set when the game should end.
    pub result: Option<WinResult>,
    /// Solo wins recorded without ending the game.
    pub achievements: Vec<Winner>,
}

/// The solo predicate that applies to a player, if any.
fn solo_predicate(player: &Player) -> Option<(RoleId, SoloWin)> {
    let catalog = RoleCatalog::standard();
    // a transformed Wild Child keeps the dealt role's ambition
    let role = if player.has(StatusFlags::TRANSFORMED) {
        player.original_role
    } else {
        player.role
    };
    catalog.get(role).solo_win.map(|win| (role, win))
}

fn solo_satisfied(player: &Player, win: SoloWin, registry: &PlayerRegistry) -> bool {
    let living = registry.living_count();
    match win {
        SoloWin::Lynched => player.death == Some(DeathCause::Lynch),
        SoloWin::VisitMajority => {
            let others = registry.len().saturating_sub(1);
            player.alive && player.visited.len() * 2 > others
        }
        SoloWin::FinalTwo => player.alive && living <= 2,
        SoloWin::LastStanding => player.alive && living == 1,
        SoloWin::LastStandingTransformed => {
            player.alive && living == 1 && player.has(StatusFlags::TRANSFORMED)
        }
    }
}

fn solo_reason(role: RoleId, win: SoloWin) -> String {
    match win {
        SoloWin::Lynched => format!("The {role} tricked the village into a lynching"),
        SoloWin::VisitMajority => format!("The {role} visited most of the village"),
        SoloWin::FinalTwo => format!("The {role} outlasted everyone else"),
        SoloWin::LastStanding | SoloWin::LastStandingTransformed => {
            format!("The {role} is the last one standing")
        }
    }
}

/// Evaluate the registry.
///
/// `achieved` lists solo winners already recorded; they are skipped so a
/// continuing game does not report the same achievement twice.
#[must_use]
pub fn evaluate(registry: &PlayerRegistry, rules: WinRules, achieved: &[Winner]) -> Evaluation {
    let final_players = || registry.all().map(FinalPlayer::from).collect::<Vec<_>>();
    let mut evaluation = Evaluation::default();

    'solo: for role in SOLO_PRECEDENCE {
        for player in registry.all() {
            let Some((solo_role, win)) = solo_predicate(player) else {
                continue;
            };
            if solo_role != role || !solo_satisfied(player, win, registry) {
                continue;
            }
            let winner = Winner::Solo {
                player: player.id,
                role: solo_role,
            };
            if achieved.contains(&winner) {
                continue;
            }
            if rules.solo_win_continues {
                evaluation.achievements.push(winner);
                break 'solo;
            }
            evaluation.result = Some(WinResult {
                winner,
                reason: solo_reason(solo_role, win),
                final_players: final_players(),
            });
            return evaluation;
        }
    }

    let wolves = registry.living().filter(|p| p.team() == Team::Werewolves).count();
    let others = registry
        .living()
        .filter(|p| p.team() != Team::Werewolves && !p.definition().pack_immune)
        .count();
    let killer_alive = registry.living().any(|p| p.role == RoleId::SerialKiller);

    let team_win = if wolves > 0 && (others == 0 || (rules.wolves_win_on_parity && wolves >= others)) {
        Some((Team::Werewolves, "The Werewolves have overrun the village"))
    } else if registry.living_count() == 0 {
        Some((Team::Villagers, "Nobody survived, but the Werewolves are gone"))
    } else if wolves == 0 && !killer_alive {
        Some((Team::Villagers, "All Werewolves have been eliminated"))
    } else {
        None
    };

    if let Some((team, reason)) = team_win {
        evaluation.result = Some(WinResult {
            winner: Winner::Team { team },
            reason: reason.to_string(),
            final_players: final_players(),
        });
    }
    evaluation
}
