//! Outbound events.
//!
//! Every event is wrapped in an `Envelope` naming who may see it. Private
//! events (readings, wolf team info, lover links, kicks) go to one player;
//! the rest are broadcast to the table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;
use super::view::PlayerView;
use crate::core::{PlayerId, PlayerTag};
use crate::day::LynchTally;
use crate::effects::Death;
use crate::night::Reading;
use crate::registry::DeathCause;
use crate::roles::RoleId;
use crate::win::{WinResult, Winner};

/// Who receives an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "player", rename_all = "snake_case")]
pub enum Recipient {
    Broadcast,
    Player(PlayerId),
}

impl Recipient {
    /// Whether `player` should see an event sent here.
    #[must_use]
    pub fn includes(self, player: PlayerId) -> bool {
        match self {
            Self::Broadcast => true,
            Self::Player(id) => id == player,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub recipient: Recipient,
    pub event: GameEvent,
}

impl Envelope {
    #[must_use]
    pub fn broadcast(event: GameEvent) -> Self {
        Self {
            recipient: Recipient::Broadcast,
            event,
        }
    }

    #[must_use]
    pub fn to(player: PlayerId, event: GameEvent) -> Self {
        Self {
            recipient: Recipient::Player(player),
            event,
        }
    }
}

/// A death as announced to the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicDeath {
    pub player: PlayerId,
    pub name: String,
    pub role: RoleId,
    pub cause: DeathCause,
    pub message: String,
}

impl PublicDeath {
    #[must_use]
    pub fn new(death: &Death, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            player: death.player,
            message: format!("{name} {}", death.cause.describe()),
            name,
            role: death.role,
            cause: death.cause,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Full snapshot for one player.
    GameStateSync { view: Box<PlayerView> },
    /// Private welcome carrying the seat handed out by `join_lobby`.
    Joined { you: PlayerTag, admin: bool },
    LobbyUpdate {
        code: String,
        players: Vec<PlayerTag>,
        roles: Vec<RoleId>,
    },
    PhaseChanged {
        phase: Phase,
        round: u32,
        timer_ends_at: Option<DateTime<Utc>>,
    },
    /// The sender's command was taken.
    ActionAccepted,
    WolfTeamInfo { teammates: Vec<PlayerTag> },
    LoverLinked { partner: PlayerTag },
    /// Private investigation result.
    SeerResult {
        target: PlayerId,
        name: String,
        reading: Reading,
    },
    Transformed { role: RoleId },
    NightResult {
        night: u32,
        deaths: Vec<PublicDeath>,
        /// Players who shrugged off a hit. Only counts are public.
        survived: usize,
        wolves_disagreed: bool,
    },
    AccusationMade {
        accuser: PlayerId,
        target: PlayerId,
        counts: Vec<(PlayerId, usize)>,
    },
    /// The accusation round tied and starts over.
    AccusationsReset { restarts: u8 },
    EndDayVoteUpdate { votes: usize, needed: usize },
    LynchVoteStarted {
        accused: PlayerId,
        name: String,
        timer_ends_at: Option<DateTime<Utc>>,
    },
    LynchVoteResult {
        tally: LynchTally,
        lynched: bool,
        deaths: Vec<PublicDeath>,
        message: String,
    },
    /// A solo win recorded while the game continues.
    SoloAchievement { winner: Winner },
    GameOver { result: WinResult },
    RematchVoteUpdate { votes: usize, needed: usize },
    ReturnToLobby,
    ForceRelogin { code: String },
    ForceKick,
}

impl GameEvent {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GameStateSync { .. } => "game_state_sync",
            Self::Joined { .. } => "joined",
            Self::LobbyUpdate { .. } => "lobby_update",
            Self::PhaseChanged { .. } => "phase_changed",
            Self::ActionAccepted => "action_accepted",
            Self::WolfTeamInfo { .. } => "wolf_team_info",
            Self::LoverLinked { .. } => "lover_linked",
            Self::SeerResult { .. } => "seer_result",
            Self::Transformed { .. } => "transformed",
            Self::NightResult { .. } => "night_result",
            Self::AccusationMade { .. } => "accusation_made",
            Self::AccusationsReset { .. } => "accusations_reset",
            Self::EndDayVoteUpdate { .. } => "end_day_vote_update",
            Self::LynchVoteStarted { .. } => "lynch_vote_started",
            Self::LynchVoteResult { .. } => "lynch_vote_result",
            Self::SoloAchievement { .. } => "solo_achievement",
            Self::GameOver { .. } => "game_over",
            Self::RematchVoteUpdate { .. } => "rematch_vote_update",
            Self::ReturnToLobby => "return_to_lobby",
            Self::ForceRelogin { .. } => "force_relogin",
            Self::ForceKick => "force_kick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_scope() {
        assert!(Recipient::Broadcast.includes(PlayerId(3)));
        assert!(Recipient::Player(PlayerId(3)).includes(PlayerId(3)));
        assert!(!Recipient::Player(PlayerId(3)).includes(PlayerId(4)));
    }

    #[test]
    fn test_event_wire_format() {
        let env = Envelope::to(
            PlayerId(1),
            GameEvent::SeerResult {
                target: PlayerId(0),
                name: "Ada".into(),
                reading: Reading::Appearance(crate::roles::Appearance::Werewolf),
            },
        );
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["recipient"]["kind"], "player");
        assert_eq!(json["recipient"]["player"], 1);
        assert_eq!(json["event"]["type"], "seer_result");
        assert_eq!(json["event"]["reading"]["kind"], "appearance");
        assert_eq!(json["event"]["reading"]["value"], "werewolf");
    }

    #[test]
    fn test_public_death_message() {
        let death = Death {
            player: PlayerId(2),
            cause: DeathCause::PackAttack,
            role: RoleId::Villager,
        };
        let public = PublicDeath::new(&death, "Bo");
        assert!(public.message.starts_with("Bo "));
        assert_eq!(public.role, RoleId::Villager);
    }
}
