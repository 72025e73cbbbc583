//! Night resolution.
//!
//! Collected actions are applied strictly by ascending role priority
//! (ties by seat). Shields are raised first, attacks become hits, and the
//! hits go through the shared death pipeline once every action has been
//! applied. Investigations only produce private readings.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::collector::{NightCollector, NightStage, PackDecision};
use crate::core::{ActionPayload, PlayerId, Potion};
use crate::effects::{Death, DeathPipeline, Hit, HitSource, PipelineReport, Survival};
use crate::error::Result;
use crate::registry::{DeathCause, PlayerRegistry, StatusFlags};
use crate::roles::{Appearance, NightAbility, RoleId, Team, PACK_PRIORITY};

/// What an investigator learned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reading {
    /// Seer and Random Seer.
    Appearance(Appearance),
    /// Sorcerer: whether the target holds a magic role.
    Magic(bool),
    /// Revealer: the target's team.
    Team(Team),
}

/// A private result for one actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateReading {
    pub actor: PlayerId,
    pub target: PlayerId,
    pub reading: Reading,
}

/// Everything one night produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightReport {
    pub night: u32,
    pub deaths: Vec<Death>,
    pub survivals: Vec<Survival>,
    pub transformed: Vec<PlayerId>,
    pub bequests: Vec<(PlayerId, PlayerId)>,
    /// The pack never converged on a victim.
    pub wolves_disagreed: bool,
    pub lovers: Option<(PlayerId, PlayerId)>,
    pub readings: Vec<PrivateReading>,
    /// Actors whose action was cancelled by a visit.
    pub blocked: Vec<PlayerId>,
}

impl NightReport {
    fn absorb(&mut self, pipeline: PipelineReport) {
        self.deaths = pipeline.deaths;
        self.survivals = pipeline.survivals;
        self.transformed = pipeline.transformed;
        self.bequests = pipeline.bequests;
    }
}

/// Scratch state while applying steps.
#[derive(Default)]
struct Work {
    report: NightReport,
    hits: Vec<Hit>,
    /// (visitor, visited)
    visits: Vec<(PlayerId, PlayerId)>,
    protectors: Vec<PlayerId>,
}

/// A step in resolution order.
#[derive(Clone, Copy, Debug)]
enum Step {
    Individual {
        actor: PlayerId,
        ability: NightAbility,
        payload: ActionPayload,
    },
    Pack,
}

/// Resolve a collected night against the registry.
///
/// Commands arriving while this runs are the caller's concern; the
/// collector is moved to `Resolved` before returning.
pub fn resolve(collector: &mut NightCollector, registry: &mut PlayerRegistry) -> Result<NightReport> {
    collector.set_stage(NightStage::Resolving);
    let report = NightReport {
        night: collector.night(),
        ..NightReport::default()
    };

    let mut steps: Vec<(u8, PlayerId, Step)> = Vec::new();
    for action in collector.actions() {
        let player = registry.get(action.actor)?;
        let def = player.definition();
        if !player.alive || action.payload.is_skip() {
            continue;
        }
        if let Some(ability) = def.ability {
            steps.push((
                def.priority,
                action.actor,
                Step::Individual {
                    actor: action.actor,
                    ability,
                    payload: action.payload,
                },
            ));
        }
    }
    if !registry.living_pack().is_empty() {
        steps.push((PACK_PRIORITY, PlayerId(0), Step::Pack));
    }
    steps.sort_by_key(|&(priority, actor, _)| (priority, actor));

    let mut work = Work {
        report,
        ..Work::default()
    };

    for (_, _, step) in steps {
        match step {
            Step::Pack => resolve_pack(collector, registry, &mut work)?,
            Step::Individual {
                actor,
                ability,
                payload,
            } => {
                if registry.has_status(actor, StatusFlags::BLOCKED) {
                    debug!(actor = %actor, "action cancelled by visit");
                    work.report.blocked.push(actor);
                    continue;
                }
                apply(registry, actor, ability, payload, &mut work)?;
            }
        }
    }

    // a Bodyguard who did not protect tonight may pick anyone tomorrow
    let idle_guards: Vec<PlayerId> = registry
        .living()
        .filter(|p| p.role == RoleId::Bodyguard && !work.protectors.contains(&p.id))
        .map(|p| p.id)
        .collect();
    for guard in idle_guards {
        registry.set_last_protected(guard, None)?;
    }

    let Work {
        mut report,
        hits,
        visits,
        ..
    } = work;
    let mut pipeline = DeathPipeline::new(registry).with_visits(visits);
    pipeline.extend(hits);
    report.absorb(pipeline.run()?);

    collector.set_stage(NightStage::Resolved);
    info!(
        night = report.night,
        deaths = report.deaths.len(),
        wolves_disagreed = report.wolves_disagreed,
        "night resolved"
    );
    Ok(report)
}

fn resolve_pack(
    collector: &NightCollector,
    registry: &mut PlayerRegistry,
    work: &mut Work,
) -> Result<()> {
    // visited members sit this one out
    let voters: Vec<PlayerId> = registry
        .living_pack()
        .into_iter()
        .filter(|&id| !registry.has_status(id, StatusFlags::BLOCKED))
        .collect();

    for &member in &voters {
        if let Some(mark) = collector.pack().vote_of(member).and_then(|v| v.mark) {
            registry.set_mark(member, Some(mark))?;
        }
    }

    match collector.pack().decision(&voters) {
        PackDecision::Agreed(Some(victim)) => {
            debug!(victim = %victim, "pack agreed");
            work.hits.push(Hit::new(victim, DeathCause::PackAttack, HitSource::Pack));
        }
        PackDecision::Agreed(None) | PackDecision::NoPack => {}
        PackDecision::Undecided => work.report.wolves_disagreed = true,
    }
    Ok(())
}

fn apply(
    registry: &mut PlayerRegistry,
    actor: PlayerId,
    ability: NightAbility,
    payload: ActionPayload,
    work: &mut Work,
) -> Result<()> {
    let Some(target) = payload.primary() else {
        return Ok(());
    };

    match ability {
        NightAbility::Visit => {
            registry.set_status(target, StatusFlags::BLOCKED, true)?;
            registry.record_visit(actor, target)?;
            work.visits.push((actor, target));
        }
        NightAbility::LinkLovers => {
            if let ActionPayload::Dual {
                first,
                second: Some(second),
            } = payload
            {
                registry.link_lovers(first, second)?;
                work.report.lovers = Some((first, second));
            }
        }
        NightAbility::RoleModel => registry.set_role_model(actor, target)?,
        NightAbility::Protect => {
            registry.set_status(target, StatusFlags::PROTECTED, true)?;
            registry.set_last_protected(actor, Some(target))?;
            work.protectors.push(actor);
        }
        NightAbility::Defend => registry.set_status(target, StatusFlags::DEFENDED, true)?,
        NightAbility::Bequeath => registry.set_bequest(actor, target)?,
        NightAbility::Mark => registry.set_mark(actor, Some(target))?,
        NightAbility::Brew => {
            if let ActionPayload::Potion { potion, target } = payload {
                match potion {
                    Potion::Heal => {
                        registry.set_status(target, StatusFlags::HEALED, true)?;
                        registry.set_status(actor, StatusFlags::HEAL_SPENT, true)?;
                    }
                    Potion::Poison => {
                        registry.set_status(target, StatusFlags::POISONED, true)?;
                        registry.set_status(actor, StatusFlags::POISON_SPENT, true)?;
                        work.hits.push(Hit::new(target, DeathCause::Poison, HitSource::Actor(actor)));
                    }
                }
            }
        }
        // pack votes live in the pack slot
        NightAbility::PackKill => {}
        NightAbility::Kill => {
            work.hits.push(Hit::new(target, DeathCause::SerialKiller, HitSource::Actor(actor)));
        }
        NightAbility::Reveal => {
            let team = registry.get(target)?.team();
            match team {
                Team::Werewolves => {
                    work.hits.push(Hit::new(target, DeathCause::Revealed, HitSource::Actor(actor)));
                }
                Team::Villagers => {
                    work.hits.push(Hit::new(actor, DeathCause::RevealBackfire, HitSource::Actor(actor)));
                }
                Team::Solo => {}
            }
            work.report.readings.push(PrivateReading {
                actor,
                target,
                reading: Reading::Team(team),
            });
        }
        NightAbility::Investigate => {
            let seen = registry.get(target)?.definition().appears_as;
            work.report.readings.push(PrivateReading {
                actor,
                target,
                reading: Reading::Appearance(seen),
            });
        }
        NightAbility::InvestigateUnreliably => {
            let truth = registry.get(target)?.definition().appears_as;
            let seen = registry
                .get(actor)?
                .sanity
                .map_or(truth, |sanity| sanity.perceive(truth));
            work.report.readings.push(PrivateReading {
                actor,
                target,
                reading: Reading::Appearance(seen),
            });
        }
        NightAbility::DetectMagic => {
            let magic = registry.get(target)?.definition().magic;
            work.report.readings.push(PrivateReading {
                actor,
                target,
                reading: Reading::Magic(magic),
            });
        }
    }
    Ok(())
}
