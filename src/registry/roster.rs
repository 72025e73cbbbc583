//! The player registry.
//!
//! Single owner of all player fields once a game has started. Resolvers
//! read snapshots and mutate only through the methods here, so every status
//! change and death passes through one place.
//!
//! Backed by `im::OrdMap`: cloning the registry is O(1), which lets the
//! coordinator keep a pre-resolution snapshot and iterate players in seat
//! order without sorting.

use im::OrdMap;
use tracing::debug;

use super::player::{DeathCause, KillOutcome, Player, Sanity, StatusFlags};
use crate::core::{GameRng, PlayerId, PlayerTag};
use crate::error::{GameError, Result, TargetRejection};
use crate::roles::{recommended_werewolves, RoleCatalog, RoleId, Team};

/// All players of one game, living and dead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerRegistry {
    players: OrdMap<PlayerId, Player>,
}

/// Check a role list against a roster size.
///
/// The pack must meet the recommended minimum for the roster, and the whole
/// Werewolf team must be strictly smaller than everyone else.
pub fn validate_balance(roles: &[RoleId], players: usize) -> Result<()> {
    if roles.len() != players {
        return Err(GameError::InvalidSetup(format!(
            "{} roles for {} players",
            roles.len(),
            players
        )));
    }

    let catalog = RoleCatalog::standard();
    let pack = roles.iter().filter(|&&r| catalog.get(r).pack_member).count();
    let team = roles
        .iter()
        .filter(|&&r| catalog.get(r).team == Team::Werewolves)
        .count();

    let needed = recommended_werewolves(players);
    if pack < needed {
        return Err(GameError::InvalidSetup(format!(
            "{players} players need at least {needed} werewolves, {pack} selected"
        )));
    }
    if team * 2 >= players {
        return Err(GameError::InvalidSetup(format!(
            "werewolf team of {team} is too large for {players} players"
        )));
    }
    Ok(())
}

impl PlayerRegistry {
    /// Seat a roster with one role per player, in order.
    ///
    /// Random Seers draw their hidden sanity from `rng`.
    pub fn initialize(roster: &[PlayerTag], roles: &[RoleId], rng: &mut GameRng) -> Result<Self> {
        validate_balance(roles, roster.len())?;

        let mut players = OrdMap::new();
        for (tag, &role) in roster.iter().zip(roles) {
            if players.contains_key(&tag.id) {
                return Err(GameError::InvalidSetup(format!("{} seated twice", tag.id)));
            }
            let mut player = Player::new(tag.id, tag.name.clone(), role);
            if role == RoleId::RandomSeer {
                player.sanity = rng.choose(&Sanity::ALL).copied();
            }
            players.insert(tag.id, player);
        }
        Ok(Self { players })
    }

    /// Build a registry directly from players, bypassing balance checks.
    #[must_use]
    pub fn from_players(players: impl IntoIterator<Item = Player>) -> Self {
        Self {
            players: players.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn get(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(&id).ok_or(GameError::UnknownPlayer(id))
    }

    fn get_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players.get_mut(&id).ok_or(GameError::UnknownPlayer(id))
    }

    #[must_use]
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    #[must_use]
    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.players.get(&id).is_some_and(|p| p.alive)
    }

    /// All players in seat order.
    pub fn all(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Living players in seat order.
    pub fn living(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.alive)
    }

    #[must_use]
    pub fn living_ids(&self) -> Vec<PlayerId> {
        self.living().map(|p| p.id).collect()
    }

    #[must_use]
    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    /// Living pack members in seat order.
    #[must_use]
    pub fn living_pack(&self) -> Vec<PlayerId> {
        self.living().filter(|p| p.in_pack()).map(|p| p.id).collect()
    }

    /// First living player holding a role.
    #[must_use]
    pub fn find_living(&self, role: RoleId) -> Option<&Player> {
        self.living().find(|p| p.role == role)
    }

    // === Status ===

    pub fn set_status(&mut self, id: PlayerId, flag: StatusFlags, value: bool) -> Result<()> {
        self.get_mut(id)?.flags.set(flag, value);
        Ok(())
    }

    #[must_use]
    pub fn has_status(&self, id: PlayerId, flag: StatusFlags) -> bool {
        self.players.get(&id).is_some_and(|p| p.has(flag))
    }

    /// Clear flags on every player.
    pub fn clear_status(&mut self, flags: StatusFlags) {
        let ids: Vec<PlayerId> = self.players.keys().copied().collect();
        for id in ids {
            if let Some(player) = self.players.get_mut(&id) {
                player.flags.remove(flags);
            }
        }
    }

    // === Life and death ===

    /// Apply a hit.
    ///
    /// Absorbable causes consume an extra life first; grief and visit links
    /// kill outright.
    pub fn kill(&mut self, id: PlayerId, cause: DeathCause) -> Result<KillOutcome> {
        let player = self.get_mut(id)?;
        if !player.alive {
            return Ok(KillOutcome::AlreadyDead);
        }
        if cause.absorbable() && player.extra_lives > 0 {
            player.extra_lives -= 1;
            debug!(player = %id, ?cause, lives_left = player.extra_lives, "extra life consumed");
            return Ok(KillOutcome::LifeConsumed);
        }
        player.alive = false;
        player.death = Some(cause);
        debug!(player = %id, ?cause, "player died");
        Ok(KillOutcome::Died)
    }

    /// Grant one extra life.
    pub fn grant_life(&mut self, id: PlayerId) -> Result<()> {
        let player = self.get_mut(id)?;
        player.extra_lives = player.extra_lives.saturating_add(1);
        Ok(())
    }

    /// Link two players as lovers. The link is symmetric.
    pub fn link_lovers(&mut self, a: PlayerId, b: PlayerId) -> Result<()> {
        if a == b {
            return Err(GameError::invalid_target(b, TargetRejection::Duplicate));
        }
        // validate both before mutating either
        self.get(a)?;
        self.get(b)?;
        self.get_mut(a)?.lover = Some(b);
        self.get_mut(b)?.lover = Some(a);
        Ok(())
    }

    /// Give a player a new role, keeping the dealt one on record.
    pub fn transform(&mut self, id: PlayerId, role: RoleId) -> Result<()> {
        let player = self.get_mut(id)?;
        player.role = role;
        player.flags.insert(StatusFlags::TRANSFORMED);
        Ok(())
    }

    // === Ability bookkeeping ===

    pub fn set_mark(&mut self, id: PlayerId, target: Option<PlayerId>) -> Result<()> {
        self.get_mut(id)?.mark = target;
        Ok(())
    }

    pub fn set_bequest(&mut self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.get_mut(id)?.bequest = Some(target);
        Ok(())
    }

    pub fn set_role_model(&mut self, id: PlayerId, model: PlayerId) -> Result<()> {
        self.get_mut(id)?.role_model = Some(model);
        Ok(())
    }

    pub fn set_last_protected(&mut self, id: PlayerId, target: Option<PlayerId>) -> Result<()> {
        self.get_mut(id)?.last_protected = target;
        Ok(())
    }

    pub fn record_visit(&mut self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.get_mut(id)?.visited.insert(target);
        Ok(())
    }
}
