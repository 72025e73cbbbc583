//! Commands accepted by a game instance.
//!
//! Commands arrive from the transport already attributed to a player.
//! They are applied one at a time; each either mutates the game and yields
//! envelopes, or fails with a `GameError` and changes nothing.

use serde::{Deserialize, Serialize};

use crate::core::{ActionPayload, Ballot, GameSettings, PhaseTimers, PlayerId};
use crate::roles::RoleId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Take a seat in the lobby. The first player to join is admin.
    JoinLobby { name: String },
    /// Remove a lobby member.
    ExcludePlayer { admin: PlayerId, player: PlayerId },
    /// Move the lobby to a new code, keeping only the admin.
    ResetLobby { admin: PlayerId, new_code: String },
    /// Deal roles and begin the first night. An empty role list uses the
    /// lobby's current selection; missing settings keep the lobby's.
    StartGame {
        admin: PlayerId,
        #[serde(default)]
        roles: Vec<RoleId>,
        #[serde(default)]
        settings: Option<GameSettings>,
    },
    SubmitNightAction { actor: PlayerId, payload: ActionPayload },
    Accuse { accuser: PlayerId, target: PlayerId },
    CastLynchVote { voter: PlayerId, ballot: Ballot },
    VoteToEndDay { voter: PlayerId },
    /// Close the current phase now; missing actors count as skipping.
    AdminNextPhase { admin: PlayerId },
    AdminSetTimers { admin: PlayerId, timers: PhaseTimers },
    AdminUpdateRoles { admin: PlayerId, roles: Vec<RoleId> },
    VoteForRematch { voter: PlayerId },
    /// A countdown finished. Stale generations are ignored.
    TimerElapsed { generation: u64 },
    /// Ask for a fresh snapshot.
    RequestSync { player: PlayerId },
}

impl Command {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinLobby { .. } => "join_lobby",
            Self::ExcludePlayer { .. } => "exclude_player",
            Self::ResetLobby { .. } => "reset_lobby",
            Self::StartGame { .. } => "start_game",
            Self::SubmitNightAction { .. } => "submit_night_action",
            Self::Accuse { .. } => "accuse",
            Self::CastLynchVote { .. } => "cast_lynch_vote",
            Self::VoteToEndDay { .. } => "vote_to_end_day",
            Self::AdminNextPhase { .. } => "admin_next_phase",
            Self::AdminSetTimers { .. } => "admin_set_timers",
            Self::AdminUpdateRoles { .. } => "admin_update_roles",
            Self::VoteForRematch { .. } => "vote_for_rematch",
            Self::TimerElapsed { .. } => "timer_elapsed",
            Self::RequestSync { .. } => "request_sync",
        }
    }

    /// The player who sent the command, if any.
    #[must_use]
    pub fn sender(&self) -> Option<PlayerId> {
        match *self {
            Self::ExcludePlayer { admin, .. }
            | Self::ResetLobby { admin, .. }
            | Self::StartGame { admin, .. }
            | Self::AdminNextPhase { admin }
            | Self::AdminSetTimers { admin, .. }
            | Self::AdminUpdateRoles { admin, .. } => Some(admin),
            Self::SubmitNightAction { actor, .. } => Some(actor),
            Self::Accuse { accuser, .. } => Some(accuser),
            Self::CastLynchVote { voter, .. }
            | Self::VoteToEndDay { voter }
            | Self::VoteForRematch { voter } => Some(voter),
            Self::RequestSync { player } => Some(player),
            Self::JoinLobby { .. } | Self::TimerElapsed { .. } => None,
        }
    }
}
