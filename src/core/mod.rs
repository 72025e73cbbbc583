//! Core engine types: players, RNG, configuration, action payloads.
//!
//! These are the building blocks every other module shares. They carry no
//! role knowledge; the role catalog gives them meaning.

pub mod player;
pub mod rng;
pub mod config;
pub mod action;

pub use player::{PlayerId, PlayerTag};
pub use rng::GameRng;
pub use config::{GameMode, GameSettings, PhaseTimers, TimedPhase};
pub use action::{ActionPayload, Ballot, NightAction, Potion};
