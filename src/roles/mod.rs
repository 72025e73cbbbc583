//! Role catalog.
//!
//! Static definitions of every role: team, how investigators see it, the
//! shape and priority of its night action, and its solo win predicate.
//! The night resolver validates payloads against `ActionShape` rather than
//! matching on role names.

pub mod definition;
pub mod catalog;

pub use definition::{
    ActionShape, Appearance, NightAbility, RoleDefinition, RoleId, SoloWin, Team, PACK_PRIORITY,
};
pub use catalog::{recommended_werewolves, RoleCatalog};
