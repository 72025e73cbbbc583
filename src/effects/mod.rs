//! Hits and the shared death pipeline.
//!
//! Both night resolution and the lynch turn their outcomes into `Hit`s and
//! hand them to a `DeathPipeline`:
//! - `Hit`: target, cause and responsible party
//! - `DeathPipeline`: applies shields, extra lives and every chain reaction
//!   until nothing new happens
//!
//! ## Honeypot attribution
//!
//! The Honeypot only retaliates against a single identifiable killer
//! (`HitSource::Actor`): the Serial Killer, the Witch's poison, the
//! Revealer, a Hunter or Backlash shot. Pack kills and lynches are
//! collective and untraceable, so no counter-kill applies to them.

mod hit;
mod pipeline;

pub use hit::{Hit, HitSource, Shield};
pub use pipeline::{Death, DeathPipeline, PipelineReport, Survival};
