//! Game configuration types.
//!
//! The transport collaborator hands the engine a `GameSettings` when the
//! admin starts a game:
//! - `GameMode`: standard (everyone on their own device) or pass-and-play
//! - `PhaseTimers`: optional per-phase countdowns
//! - rule switches (ghost mode, solo wins, parity win, role padding)
//!
//! The engine only consumes settings; it never produces them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{GameError, Result};

/// How players interact with the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Each player acts from their own device.
    #[default]
    Standard,
    /// One device is passed around; every living player submits something
    /// each night so nobody can tell roles apart by who took longer.
    PassAndPlay,
}

/// Phases that may carry a countdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimedPhase {
    Night,
    Accusation,
    LynchVote,
}

/// Per-phase countdowns in seconds.
///
/// A `None` duration, or `disabled`, removes the timeout-triggered
/// transition for that phase. Quorum and majority triggers still apply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimers {
    pub night: Option<u32>,
    pub accusation: Option<u32>,
    pub lynch_vote: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
}

impl Default for PhaseTimers {
    fn default() -> Self {
        Self {
            night: Some(90),
            accusation: Some(90),
            lynch_vote: Some(60),
            disabled: false,
        }
    }
}

impl PhaseTimers {
    /// Timers that never fire.
    #[must_use]
    pub fn off() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    /// Countdown for a phase, if one should run.
    #[must_use]
    pub fn duration_for(&self, phase: TimedPhase) -> Option<Duration> {
        if self.disabled {
            return None;
        }
        let secs = match phase {
            TimedPhase::Night => self.night,
            TimedPhase::Accusation => self.accusation,
            TimedPhase::LynchVote => self.lynch_vote,
        };
        secs.map(|s| Duration::from_secs(u64::from(s)))
    }

    /// Reject zero-length countdowns.
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("night", self.night),
            ("accusation", self.accusation),
            ("lynch_vote", self.lynch_vote),
        ] {
            if secs == Some(0) {
                return Err(GameError::InvalidSetup(format!(
                    "{name} timer must be at least one second"
                )));
            }
        }
        Ok(())
    }
}

/// Complete settings for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Standard or pass-and-play.
    pub mode: GameMode,

    /// Phase countdowns.
    pub timers: PhaseTimers,

    /// Dead players keep their day vote (accusations, end-day votes,
    /// lynch ballots). Night actions always require being alive.
    pub ghost_mode: bool,

    /// A satisfied solo condition is recorded as an achievement and the
    /// game keeps going instead of ending.
    pub solo_win_continues: bool,

    /// Minimum roster size for `start_game`.
    pub min_players: usize,

    /// Pad a short role list with Villagers instead of rejecting it.
    pub fill_with_villagers: bool,

    /// The pack also wins once it is at least as large as everyone else.
    pub wolves_win_on_parity: bool,

    /// Seed for seat shuffling; `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Accusations needed to put someone on trial. `None` means a strict
    /// majority of the day electorate.
    pub accusation_threshold: Option<usize>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::Standard,
            timers: PhaseTimers::default(),
            ghost_mode: false,
            solo_win_continues: false,
            min_players: 4,
            fill_with_villagers: true,
            wolves_win_on_parity: false,
            seed: None,
            accusation_threshold: None,
        }
    }
}

impl GameSettings {
    /// Set the interaction mode.
    #[must_use]
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the phase timers.
    #[must_use]
    pub fn with_timers(mut self, timers: PhaseTimers) -> Self {
        self.timers = timers;
        self
    }

    /// Enable or disable ghost voting.
    #[must_use]
    pub fn with_ghost_mode(mut self, enabled: bool) -> Self {
        self.ghost_mode = enabled;
        self
    }

    /// Keep playing after a solo win.
    #[must_use]
    pub fn with_solo_win_continues(mut self, enabled: bool) -> Self {
        self.solo_win_continues = enabled;
        self
    }

    /// Set the minimum roster size.
    #[must_use]
    pub fn with_min_players(mut self, min: usize) -> Self {
        self.min_players = min;
        self
    }

    /// Control Villager padding of short role lists.
    #[must_use]
    pub fn with_fill_with_villagers(mut self, enabled: bool) -> Self {
        self.fill_with_villagers = enabled;
        self
    }

    /// Enable the parity win for the pack.
    #[must_use]
    pub fn with_wolves_win_on_parity(mut self, enabled: bool) -> Self {
        self.wolves_win_on_parity = enabled;
        self
    }

    /// Fix the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fix the number of accusations that starts a trial.
    #[must_use]
    pub fn with_accusation_threshold(mut self, threshold: usize) -> Self {
        self.accusation_threshold = Some(threshold);
        self
    }

    /// Accusations needed with `electorate` day voters. A fixed count is
    /// capped at the electorate so a unanimous day can still lock a target.
    #[must_use]
    pub fn accusation_threshold_for(&self, electorate: usize) -> usize {
        match self.accusation_threshold {
            Some(fixed) => fixed.min(electorate).max(1),
            None => electorate / 2 + 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_players < 3 {
            return Err(GameError::InvalidSetup(
                "a game needs at least three players".to_string(),
            ));
        }
        if self.accusation_threshold == Some(0) {
            return Err(GameError::InvalidSetup(
                "accusation threshold must be at least one".to_string(),
            ));
        }
        self.timers.validate()
    }
}
