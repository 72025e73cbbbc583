//! Phase coordinator.
//!
//! `Game` is the single owned aggregate for one game instance. It walks
//! the phase cycle:
//!
//! ```text
//! Lobby -> Night -> Accusation -> LynchVote -> Night -> ...
//!            \            \            \
//!             +------------+------------+--> GameOver -> Lobby (rematch)
//! ```
//!
//! Quorum and majority triggers close a phase early; admin commands and
//! countdowns close it with whatever was collected.

mod command;
mod coordinator;
mod event;
mod phase;
mod view;

pub use command::Command;
pub use coordinator::{Game, Outcome, TimerRequest};
pub use event::{Envelope, GameEvent, PublicDeath, Recipient};
pub use phase::Phase;
pub use view::{ability_prompt, flavour_prompt, NightPrompt, PlayerView, SeatView, SelfView, FLAVOUR_PROMPTS};
