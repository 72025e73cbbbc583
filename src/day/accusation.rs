//! Accusations and the end-day quorum.
//!
//! Every eligible voter holds at most one accusation; a new one replaces
//! the old. The first target to reach the majority threshold is locked in
//! on the spot and later accusations cannot change it.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::error::{GameError, Ineligibility, Result, TargetRejection};
use crate::registry::PlayerRegistry;

/// Strict majority of an electorate.
#[must_use]
pub fn majority(electorate: usize) -> usize {
    electorate / 2 + 1
}

/// Players allowed to vote during the day.
#[must_use]
pub fn electorate(registry: &PlayerRegistry, ghost_mode: bool) -> Vec<PlayerId> {
    registry
        .all()
        .filter(|p| p.alive || ghost_mode)
        .map(|p| p.id)
        .collect()
}

pub(crate) fn check_voter(registry: &PlayerRegistry, voter: PlayerId, ghost_mode: bool) -> Result<()> {
    let player = registry.get(voter)?;
    if !player.alive && !ghost_mode {
        return Err(GameError::not_eligible(voter, Ineligibility::Dead));
    }
    Ok(())
}

/// Result of recording an accusation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum AccusationOutcome {
    Recorded,
    /// The threshold was reached; this target goes to trial.
    Locked(PlayerId),
}

/// How an accusation round ended without a majority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "targets", rename_all = "snake_case")]
pub enum AccusationClose {
    NoAccusations,
    Trial(PlayerId),
    /// Several targets share the top count.
    Tie(Vec<PlayerId>),
}

/// Accusation state for one day.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccusationBoard {
    threshold: usize,
    accusations: FxHashMap<PlayerId, PlayerId>,
    locked: Option<PlayerId>,
    end_day_votes: FxHashSet<PlayerId>,
    restarts: u8,
}

impl AccusationBoard {
    /// A board that locks a target at `threshold` accusations.
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    #[must_use]
    pub fn locked(&self) -> Option<PlayerId> {
        self.locked
    }

    #[must_use]
    pub fn restarts(&self) -> u8 {
        self.restarts
    }

    #[must_use]
    pub fn accusation_of(&self, accuser: PlayerId) -> Option<PlayerId> {
        self.accusations.get(&accuser).copied()
    }

    /// Record or replace an accusation.
    pub fn accuse(
        &mut self,
        registry: &PlayerRegistry,
        accuser: PlayerId,
        target: PlayerId,
        ghost_mode: bool,
    ) -> Result<AccusationOutcome> {
        if let Some(locked) = self.locked {
            return Ok(AccusationOutcome::Locked(locked));
        }
        check_voter(registry, accuser, ghost_mode)?;

        let Ok(accused) = registry.get(target) else {
            return Err(GameError::invalid_target(target, TargetRejection::Unknown));
        };
        if !accused.alive {
            return Err(GameError::invalid_target(target, TargetRejection::Dead));
        }
        if accuser == target {
            return Err(GameError::invalid_target(target, TargetRejection::SelfTarget));
        }
        if self.accusations.get(&accuser) == Some(&target) {
            return Err(GameError::not_eligible(accuser, Ineligibility::AlreadyActed));
        }

        self.accusations.insert(accuser, target);
        if self.count_for(target) >= self.threshold {
            self.locked = Some(target);
            return Ok(AccusationOutcome::Locked(target));
        }
        Ok(AccusationOutcome::Recorded)
    }

    #[must_use]
    pub fn count_for(&self, target: PlayerId) -> usize {
        self.accusations.values().filter(|&&t| t == target).count()
    }

    /// Accusation counts, highest first, ties by seat.
    #[must_use]
    pub fn tally(&self) -> Vec<(PlayerId, usize)> {
        let mut counts: FxHashMap<PlayerId, usize> = FxHashMap::default();
        for &target in self.accusations.values() {
            *counts.entry(target).or_default() += 1;
        }
        let mut tally: Vec<_> = counts.into_iter().collect();
        tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        tally
    }

    /// Close the round without a majority.
    ///
    /// A living Mayor's own accusation breaks a tie among the top targets.
    #[must_use]
    pub fn close(&self, mayor: Option<PlayerId>) -> AccusationClose {
        if let Some(locked) = self.locked {
            return AccusationClose::Trial(locked);
        }
        let tally = self.tally();
        let Some(&(_, top)) = tally.first() else {
            return AccusationClose::NoAccusations;
        };
        let leaders: Vec<PlayerId> = tally
            .iter()
            .take_while(|&&(_, count)| count == top)
            .map(|&(id, _)| id)
            .collect();
        if let [only] = leaders.as_slice() {
            return AccusationClose::Trial(*only);
        }
        if let Some(pick) = mayor.and_then(|m| self.accusation_of(m)) {
            if leaders.contains(&pick) {
                return AccusationClose::Trial(pick);
            }
        }
        AccusationClose::Tie(leaders)
    }

    /// Clear accusations for a second round after a tie.
    pub fn restart(&mut self) {
        self.accusations.clear();
        self.locked = None;
        self.restarts = self.restarts.saturating_add(1);
    }

    /// Record a vote to skip straight to night. Returns true once a strict
    /// majority of `electorate` has asked.
    pub fn vote_to_end_day(
        &mut self,
        registry: &PlayerRegistry,
        voter: PlayerId,
        ghost_mode: bool,
        electorate: usize,
    ) -> Result<bool> {
        check_voter(registry, voter, ghost_mode)?;
        if !self.end_day_votes.insert(voter) {
            return Err(GameError::not_eligible(voter, Ineligibility::AlreadyVoted));
        }
        Ok(self.end_day_votes.len() >= majority(electorate))
    }

    #[must_use]
    pub fn end_day_count(&self) -> usize {
        self.end_day_votes.len()
    }
}
