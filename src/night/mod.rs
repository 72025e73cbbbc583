//! Night phase: collection and resolution.
//!
//! Each night runs `Collecting -> Resolving -> Resolved`:
//! - `NightCollector` validates submissions against each role's action
//!   shape and keeps the pack's shared slot
//! - `resolve` applies everything in priority order and runs the death
//!   pipeline, producing a `NightReport`

mod collector;
mod resolver;

pub use collector::{NightCollector, NightStage, PackDecision, PackSlot, PackVote};
pub use resolver::{resolve, NightReport, PrivateReading, Reading};
