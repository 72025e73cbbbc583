//! Night action collection.
//!
//! Individual actors get one action each. The pack shares a single slot:
//! each member's latest choice is kept, and the slot only counts as acted
//! once every living member names the same target.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{ActionPayload, GameMode, NightAction, PlayerId, Potion};
use crate::error::{GameError, Ineligibility, Result, TargetRejection};
use crate::registry::{Player, PlayerRegistry, StatusFlags};
use crate::roles::{ActionShape, NightAbility};

/// Where a night is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightStage {
    Collecting,
    Resolving,
    Resolved,
}

/// One pack member's current choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackVote {
    /// `None` means the member picked nobody.
    pub target: Option<PlayerId>,
    /// Backlash Werewolf's revenge mark.
    pub mark: Option<PlayerId>,
}

/// Outcome of polling the pack slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackDecision {
    /// Every voter named the same victim (or nobody).
    Agreed(Option<PlayerId>),
    /// Someone has not voted or the votes differ.
    Undecided,
    /// Nobody is left to vote.
    NoPack,
}

/// Team-scoped pending action for the pack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackSlot {
    votes: FxHashMap<PlayerId, PackVote>,
}

impl PackSlot {
    #[must_use]
    pub fn vote_of(&self, member: PlayerId) -> Option<PackVote> {
        self.votes.get(&member).copied()
    }

    #[must_use]
    pub fn has_voted(&self, member: PlayerId) -> bool {
        self.votes.contains_key(&member)
    }

    /// Decide among `members`; everyone else's vote is ignored.
    #[must_use]
    pub fn decision(&self, members: &[PlayerId]) -> PackDecision {
        let mut agreed: Option<Option<PlayerId>> = None;
        for member in members {
            let Some(vote) = self.votes.get(member) else {
                return PackDecision::Undecided;
            };
            match agreed {
                None => agreed = Some(vote.target),
                Some(target) if target != vote.target => return PackDecision::Undecided,
                Some(_) => {}
            }
        }
        agreed.map_or(PackDecision::NoPack, PackDecision::Agreed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &PackVote)> {
        self.votes.iter()
    }
}

/// Collects one night's actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NightCollector {
    night: u32,
    mode: GameMode,
    stage: NightStage,
    actions: FxHashMap<PlayerId, ActionPayload>,
    pack: PackSlot,
}

impl NightCollector {
    #[must_use]
    pub fn new(night: u32, mode: GameMode) -> Self {
        Self {
            night,
            mode,
            stage: NightStage::Collecting,
            actions: FxHashMap::default(),
            pack: PackSlot::default(),
        }
    }

    /// 1-based night number.
    #[must_use]
    pub fn night(&self) -> u32 {
        self.night
    }

    #[must_use]
    pub fn stage(&self) -> NightStage {
        self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: NightStage) {
        self.stage = stage;
    }

    #[must_use]
    pub fn pack(&self) -> &PackSlot {
        &self.pack
    }

    #[must_use]
    pub fn action_of(&self, actor: PlayerId) -> Option<ActionPayload> {
        self.actions.get(&actor).copied()
    }

    /// Individual (non-pack) actions in actor order.
    #[must_use]
    pub fn actions(&self) -> Vec<NightAction> {
        let mut out: Vec<NightAction> = self
            .actions
            .iter()
            .map(|(&actor, &payload)| NightAction::new(actor, payload))
            .collect();
        out.sort_by_key(|a| a.actor);
        out
    }

    /// Whether `player` has anything recorded this night.
    #[must_use]
    pub fn has_submitted(&self, player: PlayerId) -> bool {
        self.actions.contains_key(&player) || self.pack.has_voted(player)
    }

    /// Whether `player` is expected to act tonight in standard mode.
    #[must_use]
    pub fn expects(&self, player: &Player) -> bool {
        let def = player.definition();
        if !player.alive || def.ability.is_none() || def.pack_member {
            return false;
        }
        if def.first_night_only && self.night > 1 {
            return false;
        }
        if def.ability == Some(NightAbility::Brew) {
            return !(player.has(StatusFlags::HEAL_SPENT) && player.has(StatusFlags::POISON_SPENT));
        }
        true
    }

    /// Validate and record a night action.
    pub fn submit(
        &mut self,
        registry: &mut PlayerRegistry,
        actor: PlayerId,
        payload: ActionPayload,
    ) -> Result<()> {
        if self.stage != NightStage::Collecting {
            return Err(GameError::not_eligible(actor, Ineligibility::AlreadyActed));
        }

        let player = registry.get(actor)?;
        if !player.alive {
            return Err(GameError::not_eligible(actor, Ineligibility::Dead));
        }
        let def = player.definition();

        if def.ability.is_none() {
            // pass-and-play: everyone taps through, even without an ability
            if self.mode == GameMode::PassAndPlay && payload.is_skip() {
                if self.actions.contains_key(&actor) {
                    return Err(GameError::not_eligible(actor, Ineligibility::AlreadyActed));
                }
                self.actions.insert(actor, payload);
                return registry.set_status(actor, StatusFlags::ACTED, true);
            }
            return Err(GameError::not_eligible(actor, Ineligibility::NoNightAbility));
        }

        if def.pack_member {
            let vote = self.validate_pack_vote(registry, actor, payload)?;
            if self.pack.vote_of(actor) == Some(vote) {
                return Err(GameError::not_eligible(actor, Ineligibility::AlreadyActed));
            }
            debug!(actor = %actor, target = ?vote.target, "pack vote recorded");
            self.pack.votes.insert(actor, vote);
            return registry.set_status(actor, StatusFlags::ACTED, true);
        }

        if self.actions.contains_key(&actor) {
            return Err(GameError::not_eligible(actor, Ineligibility::AlreadyActed));
        }
        if !payload.is_skip() {
            self.validate(registry, actor, payload)?;
        }
        debug!(actor = %actor, ?payload, "night action recorded");
        self.actions.insert(actor, payload);
        registry.set_status(actor, StatusFlags::ACTED, true)
    }

    fn validate_pack_vote(
        &self,
        registry: &PlayerRegistry,
        actor: PlayerId,
        payload: ActionPayload,
    ) -> Result<PackVote> {
        if payload.is_skip() {
            return Ok(PackVote {
                target: None,
                mark: None,
            });
        }
        self.validate(registry, actor, payload)?;
        let mark = match payload {
            ActionPayload::Dual { second, .. } => second,
            _ => None,
        };
        Ok(PackVote {
            target: payload.primary(),
            mark,
        })
    }

    /// Check a non-skip payload against the actor's declared shape.
    fn validate(
        &self,
        registry: &PlayerRegistry,
        actor: PlayerId,
        payload: ActionPayload,
    ) -> Result<()> {
        let player = registry.get(actor)?;
        let def = player.definition();

        if def.first_night_only && self.night > 1 {
            return Err(GameError::not_eligible(actor, Ineligibility::FirstNightOnly));
        }

        let wrong_shape = || {
            GameError::invalid_target(payload.primary().unwrap_or(actor), TargetRejection::WrongShape)
        };
        match (def.shape, payload) {
            (ActionShape::Single, ActionPayload::Single { .. }) => {}
            (ActionShape::Dual { second_optional }, ActionPayload::Dual { first, second }) => {
                match second {
                    None if !second_optional => return Err(wrong_shape()),
                    Some(second) if second == first => {
                        return Err(GameError::invalid_target(second, TargetRejection::Duplicate))
                    }
                    _ => {}
                }
            }
            // a lone target is fine when the second is optional
            (ActionShape::Dual { second_optional: true }, ActionPayload::Single { .. }) => {}
            (ActionShape::Potion, ActionPayload::Potion { potion, .. }) => {
                let spent = match potion {
                    Potion::Heal => StatusFlags::HEAL_SPENT,
                    Potion::Poison => StatusFlags::POISON_SPENT,
                };
                if player.has(spent) {
                    return Err(GameError::not_eligible(actor, Ineligibility::PotionSpent));
                }
            }
            _ => return Err(wrong_shape()),
        }

        for target in payload.targets() {
            let Ok(victim) = registry.get(target) else {
                return Err(GameError::invalid_target(target, TargetRejection::Unknown));
            };
            if !victim.alive {
                return Err(GameError::invalid_target(target, TargetRejection::Dead));
            }
            if target == actor && !def.allow_self {
                return Err(GameError::invalid_target(target, TargetRejection::SelfTarget));
            }
        }

        if def.ability == Some(NightAbility::Protect) {
            if let Some(target) = payload.primary() {
                if player.last_protected == Some(target) {
                    return Err(GameError::invalid_target(target, TargetRejection::RepeatProtection));
                }
            }
        }
        Ok(())
    }

    /// Whether the night can resolve without waiting for the timer.
    ///
    /// Standard mode waits for every expected actor and for the pack to
    /// agree. Pass-and-play waits for every living player.
    #[must_use]
    pub fn is_complete(&self, registry: &PlayerRegistry) -> bool {
        match self.mode {
            GameMode::PassAndPlay => registry.living().all(|p| self.has_submitted(p.id)),
            GameMode::Standard => {
                let individuals = registry
                    .living()
                    .filter(|p| self.expects(p))
                    .all(|p| self.actions.contains_key(&p.id));
                let pack = registry.living_pack();
                individuals && !matches!(self.pack.decision(&pack), PackDecision::Undecided)
            }
        }
    }

    /// Living players still expected to act.
    #[must_use]
    pub fn waiting_on(&self, registry: &PlayerRegistry) -> Vec<PlayerId> {
        registry
            .living()
            .filter(|p| match self.mode {
                GameMode::PassAndPlay => !self.has_submitted(p.id),
                GameMode::Standard => {
                    (self.expects(p) && !self.actions.contains_key(&p.id))
                        || (p.in_pack() && !self.pack.has_voted(p.id))
                }
            })
            .map(|p| p.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::RoleId;

    fn registry(roles: &[RoleId]) -> PlayerRegistry {
        PlayerRegistry::from_players(
            roles
                .iter()
                .enumerate()
                .map(|(i, &r)| Player::new(PlayerId(i as u8), format!("P{i}"), r)),
        )
    }

    fn p(i: u8) -> PlayerId {
        PlayerId(i)
    }

    #[test]
    fn test_second_submission_rejected() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Seer, Villager, Villager]);
        let mut night = NightCollector::new(1, GameMode::Standard);

        night.submit(&mut reg, p(1), ActionPayload::single(p(0))).unwrap();
        let err = night.submit(&mut reg, p(1), ActionPayload::single(p(0))).unwrap_err();
        assert_eq!(err, GameError::not_eligible(p(1), Ineligibility::AlreadyActed));
        assert!(reg.has_status(p(1), StatusFlags::ACTED));
    }

    #[test]
    fn test_villager_has_no_action() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Seer, Villager, Villager]);
        let mut night = NightCollector::new(1, GameMode::Standard);
        let err = night.submit(&mut reg, p(2), ActionPayload::Skip).unwrap_err();
        assert_eq!(err, GameError::not_eligible(p(2), Ineligibility::NoNightAbility));
    }

    #[test]
    fn test_pass_and_play_villager_skips() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Seer, Villager, Villager]);
        let mut night = NightCollector::new(1, GameMode::PassAndPlay);
        night.submit(&mut reg, p(2), ActionPayload::Skip).unwrap();
        assert!(night.has_submitted(p(2)));
        assert!(night.submit(&mut reg, p(2), ActionPayload::single(p(0))).is_err());
    }

    #[test]
    fn test_dead_actor_and_dead_target() {
        use crate::registry::DeathCause;
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Seer, Villager, Villager]);
        reg.kill(p(3), DeathCause::PackAttack).unwrap();
        let mut night = NightCollector::new(2, GameMode::Standard);

        let err = night.submit(&mut reg, p(1), ActionPayload::single(p(3))).unwrap_err();
        assert_eq!(err, GameError::invalid_target(p(3), TargetRejection::Dead));

        reg.kill(p(1), DeathCause::PackAttack).unwrap();
        let err = night.submit(&mut reg, p(1), ActionPayload::single(p(0))).unwrap_err();
        assert_eq!(err, GameError::not_eligible(p(1), Ineligibility::Dead));
    }

    #[test]
    fn test_self_target_rules() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Seer, Bodyguard, Villager]);
        let mut night = NightCollector::new(1, GameMode::Standard);

        let err = night.submit(&mut reg, p(1), ActionPayload::single(p(1))).unwrap_err();
        assert_eq!(err, GameError::invalid_target(p(1), TargetRejection::SelfTarget));
        night.submit(&mut reg, p(2), ActionPayload::single(p(2))).unwrap();
    }

    #[test]
    fn test_shape_mismatch() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Cupid, Witch, Villager]);
        let mut night = NightCollector::new(1, GameMode::Standard);

        let err = night.submit(&mut reg, p(1), ActionPayload::single(p(3))).unwrap_err();
        assert_eq!(err, GameError::invalid_target(p(3), TargetRejection::WrongShape));

        let err = night.submit(&mut reg, p(2), ActionPayload::single(p(3))).unwrap_err();
        assert_eq!(err, GameError::invalid_target(p(3), TargetRejection::WrongShape));

        let err = night.submit(&mut reg, p(1), ActionPayload::dual(p(3), p(3))).unwrap_err();
        assert_eq!(err, GameError::invalid_target(p(3), TargetRejection::Duplicate));

        night.submit(&mut reg, p(1), ActionPayload::dual(p(0), p(3))).unwrap();
    }

    #[test]
    fn test_cupid_first_night_only() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Cupid, Villager, Villager]);
        let mut night = NightCollector::new(2, GameMode::Standard);
        let err = night.submit(&mut reg, p(1), ActionPayload::dual(p(2), p(3))).unwrap_err();
        assert_eq!(err, GameError::not_eligible(p(1), Ineligibility::FirstNightOnly));
        assert!(!night.expects(reg.get(p(1)).unwrap()));
    }

    #[test]
    fn test_spent_potion() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Witch, Villager, Villager]);
        reg.set_status(p(1), StatusFlags::POISON_SPENT, true).unwrap();
        let mut night = NightCollector::new(2, GameMode::Standard);
        let err = night
            .submit(&mut reg, p(1), ActionPayload::potion(Potion::Poison, p(0)))
            .unwrap_err();
        assert_eq!(err, GameError::not_eligible(p(1), Ineligibility::PotionSpent));
        night
            .submit(&mut reg, p(1), ActionPayload::potion(Potion::Heal, p(2)))
            .unwrap();
    }

    #[test]
    fn test_bodyguard_repeat() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Bodyguard, Villager, Villager]);
        reg.set_last_protected(p(1), Some(p(2))).unwrap();
        let mut night = NightCollector::new(2, GameMode::Standard);
        let err = night.submit(&mut reg, p(1), ActionPayload::single(p(2))).unwrap_err();
        assert_eq!(err, GameError::invalid_target(p(2), TargetRejection::RepeatProtection));
    }

    #[test]
    fn test_pack_consensus() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Werewolf, Villager, Villager, Villager]);
        let mut night = NightCollector::new(1, GameMode::Standard);
        let pack = reg.living_pack();

        night.submit(&mut reg, p(0), ActionPayload::single(p(2))).unwrap();
        assert_eq!(night.pack().decision(&pack), PackDecision::Undecided);

        night.submit(&mut reg, p(1), ActionPayload::single(p(3))).unwrap();
        assert_eq!(night.pack().decision(&pack), PackDecision::Undecided);
        assert!(!night.is_complete(&reg));

        // latest choice wins; an identical resubmission is rejected
        night.submit(&mut reg, p(1), ActionPayload::single(p(2))).unwrap();
        assert_eq!(night.pack().decision(&pack), PackDecision::Agreed(Some(p(2))));
        assert!(night.submit(&mut reg, p(1), ActionPayload::single(p(2))).is_err());
        assert!(night.is_complete(&reg));
    }

    #[test]
    fn test_backlash_mark() {
        use RoleId::*;
        let mut reg = registry(&[BacklashWerewolf, Villager, Villager, Villager]);
        let mut night = NightCollector::new(1, GameMode::Standard);
        night
            .submit(&mut reg, p(0), ActionPayload::dual(p(1), p(2)))
            .unwrap();
        let vote = night.pack().vote_of(p(0)).unwrap();
        assert_eq!(vote.target, Some(p(1)));
        assert_eq!(vote.mark, Some(p(2)));
    }

    #[test]
    fn test_waiting_on() {
        use RoleId::*;
        let mut reg = registry(&[Werewolf, Seer, Villager, Villager]);
        let mut night = NightCollector::new(1, GameMode::Standard);
        assert_eq!(night.waiting_on(&reg), vec![p(0), p(1)]);
        night.submit(&mut reg, p(1), ActionPayload::Skip).unwrap();
        assert_eq!(night.waiting_on(&reg), vec![p(0)]);
    }
}
