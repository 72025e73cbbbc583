//! The lynch vote.
//!
//! One ballot per eligible voter. When the vote closes, missing ballots
//! count as "no". If yes and no are level, a Mayor who voted adds one more
//! to their side. A strict yes majority lynches.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::accusation::check_voter;
use crate::core::{Ballot, PlayerId};
use crate::error::{GameError, Ineligibility, Result};
use crate::registry::PlayerRegistry;

/// Final count of a lynch vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LynchTally {
    pub accused: PlayerId,
    pub yes: usize,
    pub no: usize,
    /// Ballots never cast, already included in `no`.
    pub missing: usize,
    pub mayor_broke_tie: bool,
}

impl LynchTally {
    #[must_use]
    pub fn lynched(&self) -> bool {
        self.yes > self.no
    }
}

/// Ballots for one trial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LynchBallot {
    accused: PlayerId,
    votes: FxHashMap<PlayerId, Ballot>,
}

impl LynchBallot {
    #[must_use]
    pub fn new(accused: PlayerId) -> Self {
        Self {
            accused,
            votes: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn accused(&self) -> PlayerId {
        self.accused
    }

    #[must_use]
    pub fn ballot_of(&self, voter: PlayerId) -> Option<Ballot> {
        self.votes.get(&voter).copied()
    }

    #[must_use]
    pub fn cast_count(&self) -> usize {
        self.votes.len()
    }

    pub fn cast(
        &mut self,
        registry: &PlayerRegistry,
        voter: PlayerId,
        ballot: Ballot,
        ghost_mode: bool,
    ) -> Result<()> {
        check_voter(registry, voter, ghost_mode)?;
        if self.votes.contains_key(&voter) {
            return Err(GameError::not_eligible(voter, Ineligibility::AlreadyVoted));
        }
        self.votes.insert(voter, ballot);
        Ok(())
    }

    /// Whether everyone in `electorate` has voted.
    #[must_use]
    pub fn is_complete(&self, electorate: &[PlayerId]) -> bool {
        electorate.iter().all(|v| self.votes.contains_key(v))
    }

    /// Count the vote over `electorate`.
    #[must_use]
    pub fn tally(&self, electorate: &[PlayerId], mayor: Option<PlayerId>) -> LynchTally {
        let mut yes = 0;
        let mut no = 0;
        let mut missing = 0;
        for voter in electorate {
            match self.votes.get(voter) {
                Some(Ballot::Yes) => yes += 1,
                Some(Ballot::No) => no += 1,
                None => missing += 1,
            }
        }
        no += missing;

        let mut mayor_broke_tie = false;
        if yes == no {
            if let Some(side) = mayor.and_then(|m| self.ballot_of(m)) {
                match side {
                    Ballot::Yes => yes += 1,
                    Ballot::No => no += 1,
                }
                mayor_broke_tie = true;
            }
        }

        LynchTally {
            accused: self.accused,
            yes,
            no,
            missing,
            mayor_broke_tie,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Player;
    use crate::roles::RoleId;

    fn p(i: u8) -> PlayerId {
        PlayerId(i)
    }

    fn table(roles: &[RoleId]) -> PlayerRegistry {
        PlayerRegistry::from_players(
            roles
                .iter()
                .enumerate()
                .map(|(i, &r)| Player::new(PlayerId(i as u8), format!("P{i}"), r)),
        )
    }

    #[test]
    fn test_mayor_breaks_tie() {
        use RoleId::*;
        let reg = table(&[Werewolf, Villager, Villager, Villager, Mayor]);
        let electorate = reg.living_ids();
        let mut ballot = LynchBallot::new(p(1));
        ballot.cast(&reg, p(0), Ballot::No, false).unwrap();
        ballot.cast(&reg, p(1), Ballot::No, false).unwrap();
        ballot.cast(&reg, p(2), Ballot::Yes, false).unwrap();
        ballot.cast(&reg, p(3), Ballot::Yes, false).unwrap();
        ballot.cast(&reg, p(4), Ballot::Yes, false).unwrap();

        let tally = ballot.tally(&electorate, Some(p(4)));
        assert!(tally.lynched());
        assert_eq!((tally.yes, tally.no), (3, 2));
        assert!(!tally.mayor_broke_tie);
    }

    #[test]
    fn test_tie_without_mayor_fails() {
        let reg = table(&[RoleId::Villager; 4]);
        let electorate = reg.living_ids();
        let mut ballot = LynchBallot::new(p(0));
        ballot.cast(&reg, p(0), Ballot::No, false).unwrap();
        ballot.cast(&reg, p(1), Ballot::No, false).unwrap();
        ballot.cast(&reg, p(2), Ballot::Yes, false).unwrap();
        ballot.cast(&reg, p(3), Ballot::Yes, false).unwrap();
        assert!(!ballot.tally(&electorate, None).lynched());
    }

    #[test]
    fn test_mayor_tie_break_with_missing_ballot() {
        use RoleId::*;
        let reg = table(&[Werewolf, Villager, Villager, Mayor]);
        let electorate = reg.living_ids();
        let mut ballot = LynchBallot::new(p(0));
        ballot.cast(&reg, p(1), Ballot::Yes, false).unwrap();
        ballot.cast(&reg, p(3), Ballot::Yes, false).unwrap();
        ballot.cast(&reg, p(2), Ballot::No, false).unwrap();

        // seat 0 never voted: 2 yes, 2 no, Mayor sided yes
        let tally = ballot.tally(&electorate, Some(p(3)));
        assert_eq!(tally.missing, 1);
        assert!(tally.mayor_broke_tie);
        assert!(tally.lynched());
    }

    #[test]
    fn test_one_ballot_each() {
        let reg = table(&[RoleId::Villager; 4]);
        let mut ballot = LynchBallot::new(p(0));
        ballot.cast(&reg, p(1), Ballot::Yes, false).unwrap();
        assert_eq!(
            ballot.cast(&reg, p(1), Ballot::No, false),
            Err(GameError::not_eligible(p(1), Ineligibility::AlreadyVoted))
        );
        assert!(!ballot.is_complete(&reg.living_ids()));
    }
}
