//! # werewolf-engine
//!
//! Phase state machine and role-resolution engine for Werewolves/Mafia
//! style party games.
//!
//! ## Design Principles
//!
//! 1. **Data-Driven Roles**: Every role is a `RoleDefinition` in a static
//!    catalog: team, night ability, action shape, priority and flags.
//!    Resolution dispatches on the ability, never on the role name.
//!
//! 2. **One Owner Per Game**: A `Game` aggregate holds all state for one
//!    instance. Commands are applied one at a time and either succeed or
//!    leave nothing changed.
//!
//! 3. **Deterministic Resolution**: Night actions resolve by ascending
//!    priority, then seat. Seeded RNG makes role deals reproducible.
//!
//! ## Architecture
//!
//! - **Shared Death Pipeline**: Night kills and lynches feed the same
//!   pipeline, which runs lover grief, Honeypot retaliation, Hunter shots,
//!   Martyr bequests and Wild Child transformation to a fixed point.
//!
//! - **Persistent Data Structures**: The player registry is an `im`
//!   ordered map so snapshots are cheap.
//!
//! - **Actor Per Game**: The `hub` module runs each game in a tokio task
//!   behind a bounded command queue.
//!
//! ## Modules
//!
//! - `core`: Player ids, RNG, settings, action payloads
//! - `roles`: Role definitions and the catalog
//! - `registry`: Seated players and their status
//! - `effects`: Hits and the death pipeline
//! - `night`: Night action collection and resolution
//! - `day`: Accusations and the lynch vote
//! - `win`: Win evaluation
//! - `game`: Phase coordinator, commands, events and snapshots
//! - `hub`: Concurrent directory of running games

pub mod core;
pub mod roles;
pub mod registry;
pub mod effects;
pub mod night;
pub mod day;
pub mod win;
pub mod game;
pub mod hub;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    PlayerId, PlayerTag,
    GameRng,
    GameMode, GameSettings, PhaseTimers, TimedPhase,
    ActionPayload, Ballot, NightAction, Potion,
};

pub use crate::roles::{
    ActionShape, Appearance, NightAbility, RoleCatalog, RoleDefinition, RoleId, SoloWin, Team,
};

pub use crate::registry::{DeathCause, Player, PlayerRegistry, Sanity, StatusFlags};

pub use crate::effects::{DeathPipeline, Hit, HitSource, PipelineReport, Shield};

pub use crate::night::{NightCollector, NightReport, PackDecision, Reading};

pub use crate::day::{AccusationBoard, AccusationOutcome, LynchBallot, LynchTally};

pub use crate::win::{evaluate, WinResult, WinRules, Winner};

pub use crate::game::{Command, Envelope, Game, GameEvent, Outcome, Phase, PlayerView, Recipient};

pub use crate::hub::{GameHandle, GameHub, Published};

pub use crate::error::{GameError, Ineligibility, Result, TargetRejection};
