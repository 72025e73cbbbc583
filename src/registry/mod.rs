//! Player registry.
//!
//! Maps each seat to its role, life state and status effects. Created at
//! game start from the lobby roster and the dealt roles; players are never
//! removed mid-game, the dead stay on record with `alive == false`.

pub mod player;
pub mod roster;

pub use player::{DeathCause, KillOutcome, Player, Sanity, StatusFlags};
pub use roster::{validate_balance, PlayerRegistry};
