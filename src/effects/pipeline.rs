//! The death pipeline.
//!
//! Night resolution and the lynch both feed hits into one `DeathPipeline`,
//! which applies them in order and keeps going until no new hits appear.
//! Each death can enqueue more:
//!
//! - the lover dies of grief
//! - the other half of a night visit shares the fate
//! - a Honeypot takes its identifiable killer along
//! - a Hunter or Backlash Werewolf strikes their marked player
//! - a Martyr passes an extra life to their beneficiary
//! - a Wild Child whose role model died joins the pack
//!
//! Dead players never receive a second death, so the queue is finite.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::hit::{Hit, HitSource, Shield};
use crate::core::PlayerId;
use crate::error::{GameError, Result};
use crate::registry::{DeathCause, KillOutcome, PlayerRegistry, StatusFlags};
use crate::roles::RoleId;

/// A finalized death.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Death {
    pub player: PlayerId,
    pub cause: DeathCause,
    /// Role held at the time of death.
    pub role: RoleId,
}

/// A hit that did not kill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survival {
    pub player: PlayerId,
    pub cause: DeathCause,
    pub shield: Shield,
}

/// Everything a pipeline run changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub deaths: Vec<Death>,
    pub survivals: Vec<Survival>,
    /// Wild Children who joined the pack.
    pub transformed: Vec<PlayerId>,
    /// (martyr, beneficiary)
    pub bequests: Vec<(PlayerId, PlayerId)>,
}

impl PipelineReport {
    #[must_use]
    pub fn died(&self, player: PlayerId) -> bool {
        self.deaths.iter().any(|d| d.player == player)
    }

    pub fn merge(&mut self, other: PipelineReport) {
        self.deaths.extend(other.deaths);
        self.survivals.extend(other.survivals);
        self.transformed.extend(other.transformed);
        self.bequests.extend(other.bequests);
    }
}

/// Applies hits to the registry until a fixed point is reached.
pub struct DeathPipeline<'a> {
    registry: &'a mut PlayerRegistry,
    queue: VecDeque<Hit>,
    /// Tonight's (visitor, visited) pairs.
    visits: Vec<(PlayerId, PlayerId)>,
    report: PipelineReport,
}

impl<'a> DeathPipeline<'a> {
    pub fn new(registry: &'a mut PlayerRegistry) -> Self {
        Self {
            registry,
            queue: VecDeque::new(),
            visits: Vec::new(),
            report: PipelineReport::default(),
        }
    }

    /// Link visitor and visited for the rest of this run.
    #[must_use]
    pub fn with_visits(mut self, visits: Vec<(PlayerId, PlayerId)>) -> Self {
        self.visits = visits;
        self
    }

    pub fn push(&mut self, hit: Hit) {
        self.queue.push_back(hit);
    }

    pub fn extend(&mut self, hits: impl IntoIterator<Item = Hit>) {
        self.queue.extend(hits);
    }

    /// Process every queued hit and every consequence.
    pub fn run(mut self) -> Result<PipelineReport> {
        let mut steps = 0usize;
        let limit = self.registry.len() * 8 + 64;

        while let Some(hit) = self.queue.pop_front() {
            steps += 1;
            if steps > limit {
                return Err(GameError::Internal(
                    "death pipeline did not reach a fixed point".to_string(),
                ));
            }
            self.apply(hit)?;
        }
        Ok(self.report)
    }

    fn apply(&mut self, hit: Hit) -> Result<()> {
        let target = self.registry.get(hit.target)?;
        if !target.alive {
            return Ok(());
        }

        if let Some(shield) = hit.blocked_by(target) {
            debug!(player = %hit.target, cause = ?hit.cause, ?shield, "hit blocked");
            self.report.survivals.push(Survival {
                player: hit.target,
                cause: hit.cause,
                shield,
            });
            return Ok(());
        }

        let role = target.role;
        match self.registry.kill(hit.target, hit.cause)? {
            KillOutcome::AlreadyDead => Ok(()),
            KillOutcome::LifeConsumed => {
                self.report.survivals.push(Survival {
                    player: hit.target,
                    cause: hit.cause,
                    shield: Shield::ExtraLife,
                });
                Ok(())
            }
            KillOutcome::Died => {
                self.report.deaths.push(Death {
                    player: hit.target,
                    cause: hit.cause,
                    role,
                });
                self.after_death(hit)
            }
        }
    }

    fn after_death(&mut self, hit: Hit) -> Result<()> {
        let dead = self.registry.get(hit.target)?.clone();

        if let Some(lover) = dead.lover {
            self.push(Hit::new(lover, DeathCause::Heartbreak, HitSource::Cascade));
        }

        let linked: Vec<PlayerId> = self
            .visits
            .iter()
            .filter_map(|&(visitor, visited)| {
                if visitor == dead.id {
                    Some(visited)
                } else if visited == dead.id {
                    Some(visitor)
                } else {
                    None
                }
            })
            .collect();
        for other in linked {
            self.push(Hit::new(other, DeathCause::VisitLink, HitSource::Cascade));
        }

        // only a single identifiable killer is caught by the trap
        if dead.role == RoleId::Honeypot {
            if let Some(killer) = hit.source.actor().filter(|&k| k != dead.id) {
                self.push(Hit::new(
                    killer,
                    DeathCause::HoneypotTrap,
                    HitSource::Actor(dead.id),
                ));
            }
        }

        if let Some(mark) = dead.mark {
            let cause = match dead.role {
                RoleId::Hunter => Some(DeathCause::HunterArrow),
                RoleId::BacklashWerewolf => Some(DeathCause::BacklashStrike),
                _ => None,
            };
            if let Some(cause) = cause {
                self.push(Hit::new(mark, cause, HitSource::Actor(dead.id)));
            }
        }

        if dead.role == RoleId::Martyr {
            if let Some(beneficiary) = dead.bequest.filter(|&b| self.registry.is_alive(b)) {
                self.registry.grant_life(beneficiary)?;
                self.report.bequests.push((dead.id, beneficiary));
            }
        }

        let orphans: Vec<PlayerId> = self
            .registry
            .living()
            .filter(|p| {
                p.role == RoleId::WildChild
                    && !p.has(StatusFlags::TRANSFORMED)
                    && p.role_model == Some(dead.id)
            })
            .map(|p| p.id)
            .collect();
        for child in orphans {
            self.registry.transform(child, RoleId::Werewolf)?;
            self.report.transformed.push(child);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Player;

    fn registry(roles: &[RoleId]) -> PlayerRegistry {
        PlayerRegistry::from_players(
            roles
                .iter()
                .enumerate()
                .map(|(i, &r)| Player::new(PlayerId(i as u8), format!("P{i}"), r)),
        )
    }

    fn run(registry: &mut PlayerRegistry, hits: Vec<Hit>) -> PipelineReport {
        let mut pipeline = DeathPipeline::new(registry);
        pipeline.extend(hits);
        pipeline.run().unwrap()
    }

    #[test]
    fn test_lover_cascade() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Villager, ToughVillager, Seer]);
        reg.link_lovers(PlayerId(1), PlayerId(2)).unwrap();

        let report = run(
            &mut reg,
            vec![Hit::new(PlayerId(1), DeathCause::PackAttack, HitSource::Pack)],
        );

        assert!(report.died(PlayerId(1)));
        assert!(report.died(PlayerId(2)));
        assert!(!reg.is_alive(PlayerId(2)));
        assert_eq!(reg.get(PlayerId(2)).unwrap().death, Some(DeathCause::Heartbreak));
    }

    #[test]
    fn test_honeypot_catches_single_killer() {
        use RoleId::*;
        let mut reg = registry(&[SerialKiller, Honeypot, Villager, Villager]);
        let report = run(
            &mut reg,
            vec![Hit::new(
                PlayerId(1),
                DeathCause::SerialKiller,
                HitSource::Actor(PlayerId(0)),
            )],
        );
        assert!(report.died(PlayerId(1)));
        assert!(report.died(PlayerId(0)));
        assert_eq!(reg.get(PlayerId(0)).unwrap().death, Some(DeathCause::HoneypotTrap));
    }

    #[test]
    fn test_honeypot_ignores_pack_and_mob() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Honeypot, Honeypot, Villager]);
        let report = run(
            &mut reg,
            vec![
                Hit::new(PlayerId(1), DeathCause::PackAttack, HitSource::Pack),
                Hit::new(PlayerId(2), DeathCause::Lynch, HitSource::Mob),
            ],
        );
        assert_eq!(report.deaths.len(), 2);
        assert!(reg.is_alive(PlayerId(0)));
    }

    #[test]
    fn test_hunter_arrow_and_tough_target() {
        use RoleId::*;
        let mut reg = registry(&[ToughWerewolf, Hunter, Villager, Villager]);
        reg.set_mark(PlayerId(1), Some(PlayerId(0))).unwrap();

        let report = run(
            &mut reg,
            vec![Hit::new(PlayerId(1), DeathCause::Lynch, HitSource::Mob)],
        );

        assert!(report.died(PlayerId(1)));
        assert!(reg.is_alive(PlayerId(0)));
        assert_eq!(report.survivals[0].shield, Shield::ExtraLife);
        assert_eq!(reg.get(PlayerId(0)).unwrap().extra_lives, 0);
    }

    #[test]
    fn test_visit_link() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Prostitute, Villager, Villager]);
        let mut pipeline =
            DeathPipeline::new(&mut reg).with_visits(vec![(PlayerId(1), PlayerId(2))]);
        pipeline.push(Hit::new(PlayerId(2), DeathCause::PackAttack, HitSource::Pack));
        let report = pipeline.run().unwrap();
        assert!(report.died(PlayerId(2)));
        assert!(report.died(PlayerId(1)));
    }

    #[test]
    fn test_martyr_bequest_and_wild_child() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Martyr, WildChild, Villager, Villager]);
        reg.set_bequest(PlayerId(1), PlayerId(3)).unwrap();
        reg.set_role_model(PlayerId(2), PlayerId(1)).unwrap();

        let report = run(
            &mut reg,
            vec![Hit::new(PlayerId(1), DeathCause::PackAttack, HitSource::Pack)],
        );

        assert_eq!(report.bequests, vec![(PlayerId(1), PlayerId(3))]);
        assert_eq!(reg.get(PlayerId(3)).unwrap().extra_lives, 1);
        assert_eq!(report.transformed, vec![PlayerId(2)]);
        assert!(reg.get(PlayerId(2)).unwrap().in_pack());
    }

    #[test]
    fn test_protection_blocks_attack() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Villager, Bodyguard, Villager]);
        reg.set_status(PlayerId(1), StatusFlags::PROTECTED, true).unwrap();

        let report = run(
            &mut reg,
            vec![Hit::new(PlayerId(1), DeathCause::PackAttack, HitSource::Pack)],
        );
        assert!(report.deaths.is_empty());
        assert_eq!(report.survivals[0].shield, Shield::Protected);
    }
}
