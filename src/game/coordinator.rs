//! The phase coordinator.
//!
//! `Game` owns everything about one game instance and applies commands one
//! at a time. A command either fails with no effect, or mutates the game
//! and returns an `Outcome`: the envelopes to deliver and, when a new
//! phase started, the countdown to arm.
//!
//! The coordinator never sleeps. Countdowns are handed to the caller as a
//! `TimerRequest` tagged with a generation; a `TimerElapsed` carrying an
//! older generation is ignored, so a timer that fires after the phase
//! already moved on is a no-op.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use tracing::{debug, error, info};

use super::command::Command;
use super::event::{Envelope, GameEvent, PublicDeath};
use super::phase::Phase;
use super::view::{ability_prompt, flavour_prompt, NightPrompt, PlayerView, SeatView, SelfView};
use crate::core::{ActionPayload, Ballot, GameMode, GameRng, GameSettings, PhaseTimers, PlayerId, PlayerTag};
use crate::day::{electorate, majority, AccusationBoard, AccusationClose, AccusationOutcome, LynchBallot};
use crate::effects::{DeathPipeline, Hit, HitSource, PipelineReport, Shield};
use crate::error::{GameError, Ineligibility, Result, TargetRejection};
use crate::night::{resolve, NightCollector, NightReport};
use crate::registry::{DeathCause, PlayerRegistry, StatusFlags};
use crate::roles::{ActionShape, NightAbility, RoleId};
use crate::win::{evaluate, WinResult, WinRules, Winner};

/// Ask the caller to wake the game after `after`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerRequest {
    pub generation: u64,
    pub after: Duration,
}

/// What applying one command produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    pub envelopes: Vec<Envelope>,
    pub timer: Option<TimerRequest>,
}

/// One game instance.
#[derive(Clone, Debug)]
pub struct Game {
    code: String,
    phase: Phase,
    settings: GameSettings,
    closed: bool,

    // Lobby
    roster: Vec<PlayerTag>,
    admin: Option<PlayerId>,
    next_seat: u16,
    lobby_roles: Vec<RoleId>,

    // Running game
    registry: PlayerRegistry,
    night_number: u32,
    night: Option<NightCollector>,
    board: Option<AccusationBoard>,
    ballot: Option<LynchBallot>,
    achieved: Vec<Winner>,
    result: Option<WinResult>,
    rematch_votes: FxHashSet<PlayerId>,
    prompts: GameRng,

    // Timers
    timer_generation: u64,
    timer_ends_at: Option<DateTime<Utc>>,

    // Staged output of the command being applied
    out: Vec<Envelope>,
    timer: Option<TimerRequest>,
}

impl Game {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            phase: Phase::Lobby,
            settings: GameSettings::default(),
            closed: false,
            roster: Vec::new(),
            admin: None,
            next_seat: 0,
            lobby_roles: Vec::new(),
            registry: PlayerRegistry::default(),
            night_number: 0,
            night: None,
            board: None,
            ballot: None,
            achieved: Vec::new(),
            result: None,
            rematch_votes: FxHashSet::default(),
            prompts: GameRng::new(0),
            timer_generation: 0,
            timer_ends_at: None,
            out: Vec::new(),
            timer: None,
        }
    }

    /// Use settings other than the defaults before the game starts.
    #[must_use]
    pub fn with_settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings;
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Ended by a broken invariant; no further commands are accepted.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn roster(&self) -> &[PlayerTag] {
        &self.roster
    }

    #[must_use]
    pub fn admin(&self) -> Option<PlayerId> {
        self.admin
    }

    #[must_use]
    pub fn lobby_roles(&self) -> &[RoleId] {
        &self.lobby_roles
    }

    #[must_use]
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn night_number(&self) -> u32 {
        self.night_number
    }

    #[must_use]
    pub fn night(&self) -> Option<&NightCollector> {
        self.night.as_ref()
    }

    #[must_use]
    pub fn accusations(&self) -> Option<&AccusationBoard> {
        self.board.as_ref()
    }

    #[must_use]
    pub fn lynch_ballot(&self) -> Option<&LynchBallot> {
        self.ballot.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&WinResult> {
        self.result.as_ref()
    }

    /// Solo wins recorded while the game went on.
    #[must_use]
    pub fn achievements(&self) -> &[Winner] {
        &self.achieved
    }

    #[must_use]
    pub fn timer_generation(&self) -> u64 {
        self.timer_generation
    }

    #[must_use]
    pub fn timer_ends_at(&self) -> Option<DateTime<Utc>> {
        self.timer_ends_at
    }

    // === Command entry points ===

    /// Apply a command using the wall clock.
    pub fn handle(&mut self, command: Command) -> Result<Outcome> {
        self.handle_at(command, Utc::now())
    }

    /// Apply a command as of `now`.
    ///
    /// On a validation error nothing changes and no envelopes are produced.
    /// An `Internal` error ends the game instance.
    pub fn handle_at(&mut self, command: Command, now: DateTime<Utc>) -> Result<Outcome> {
        if self.closed {
            return Err(GameError::GameClosed(self.code.clone()));
        }
        self.out.clear();
        self.timer = None;

        let name = command.name();
        match self.apply(command, now) {
            Ok(()) => {
                debug!(game = %self.code, command = name, phase = %self.phase, "command applied");
                Ok(Outcome {
                    envelopes: std::mem::take(&mut self.out),
                    timer: self.timer.take(),
                })
            }
            Err(err) => {
                self.out.clear();
                self.timer = None;
                if err.is_fatal() {
                    error!(game = %self.code, command = name, error = %err, "game aborted");
                    self.abort();
                }
                Err(err)
            }
        }
    }

    fn apply(&mut self, command: Command, now: DateTime<Utc>) -> Result<()> {
        match command {
            Command::JoinLobby { name } => self.join(name),
            Command::ExcludePlayer { admin, player } => self.exclude(admin, player),
            Command::ResetLobby { admin, new_code } => self.reset_lobby(admin, new_code),
            Command::StartGame {
                admin,
                roles,
                settings,
            } => self.start(admin, roles, settings, now),
            Command::SubmitNightAction { actor, payload } => self.submit_night_action(actor, payload, now),
            Command::Accuse { accuser, target } => self.accuse(accuser, target, now),
            Command::CastLynchVote { voter, ballot } => self.cast_lynch_vote(voter, ballot, now),
            Command::VoteToEndDay { voter } => self.vote_to_end_day(voter, now),
            Command::AdminNextPhase { admin } => {
                self.require_admin(admin)?;
                info!(game = %self.code, phase = %self.phase, "admin forced the phase to close");
                self.close_phase(now)
            }
            Command::AdminSetTimers { admin, timers } => self.set_timers(admin, timers),
            Command::AdminUpdateRoles { admin, roles } => self.update_roles(admin, roles),
            Command::VoteForRematch { voter } => self.vote_for_rematch(voter),
            Command::TimerElapsed { generation } => self.timer_elapsed(generation, now),
            Command::RequestSync { player } => {
                self.require_seated(player)?;
                let view = self.view_for(player);
                self.emit_to(player, GameEvent::GameStateSync { view: Box::new(view) });
                Ok(())
            }
        }
    }

    // === Lobby ===

    fn join(&mut self, name: String) -> Result<()> {
        self.require_phase(Phase::Lobby)?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(GameError::InvalidSetup("name cannot be empty".to_string()));
        }
        if self
            .roster
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(&name))
        {
            return Err(GameError::InvalidSetup(format!("name {name} is taken")));
        }
        let seat = u8::try_from(self.next_seat)
            .map_err(|_| GameError::InvalidSetup("lobby is full".to_string()))?;
        self.next_seat += 1;

        let id = PlayerId(seat);
        let admin = self.admin.is_none();
        if admin {
            self.admin = Some(id);
        }
        let tag = PlayerTag::new(id, name);
        info!(game = %self.code, player = %id, name = %tag.name, admin, "player joined");
        self.roster.push(tag.clone());
        self.emit_to(id, GameEvent::Joined { you: tag, admin });
        self.emit_lobby();
        Ok(())
    }

    fn exclude(&mut self, admin: PlayerId, player: PlayerId) -> Result<()> {
        self.require_phase(Phase::Lobby)?;
        self.require_admin(admin)?;
        if admin == player {
            return Err(GameError::invalid_target(player, TargetRejection::SelfTarget));
        }
        self.require_seated(player)?;
        self.roster.retain(|t| t.id != player);
        self.rematch_votes.remove(&player);
        info!(game = %self.code, player = %player, "player excluded");
        self.emit_to(player, GameEvent::ForceKick);
        self.emit_lobby();
        Ok(())
    }

    fn reset_lobby(&mut self, admin: PlayerId, new_code: String) -> Result<()> {
        if self.phase.in_progress() {
            return Err(GameError::WrongPhase {
                expected: Phase::Lobby,
                actual: self.phase,
            });
        }
        self.require_admin(admin)?;
        let new_code = new_code.trim().to_string();
        if new_code.is_empty() {
            return Err(GameError::InvalidSetup("new code cannot be empty".to_string()));
        }

        for tag in self.roster.iter().filter(|t| t.id != admin) {
            self.out.push(Envelope::to(
                tag.id,
                GameEvent::ForceRelogin {
                    code: new_code.clone(),
                },
            ));
        }
        self.roster.retain(|t| t.id == admin);
        info!(game = %self.code, new_code = %new_code, "lobby reset");
        self.code = new_code;
        self.return_to_lobby();
        Ok(())
    }

    fn update_roles(&mut self, admin: PlayerId, roles: Vec<RoleId>) -> Result<()> {
        self.require_phase(Phase::Lobby)?;
        self.require_admin(admin)?;
        self.lobby_roles = roles;
        self.emit_lobby();
        Ok(())
    }

    fn set_timers(&mut self, admin: PlayerId, timers: PhaseTimers) -> Result<()> {
        self.require_phase(Phase::Lobby)?;
        self.require_admin(admin)?;
        timers.validate()?;
        info!(game = %self.code, ?timers, "timers updated");
        self.settings.timers = timers;
        self.emit_to(admin, GameEvent::ActionAccepted);
        Ok(())
    }

    // === Start ===

    fn start(
        &mut self,
        admin: PlayerId,
        roles: Vec<RoleId>,
        settings: Option<GameSettings>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let settings = settings.unwrap_or_else(|| self.settings.clone());
        let (mut roles, mut rng) = self.prepare_start(admin, roles, &settings)?;
        rng.shuffle(&mut roles);
        self.deal(roles, settings, &mut rng, now)
    }

    /// Start with roles dealt in seat order instead of shuffled.
    ///
    /// Same validation as `start_game`. Meant for tests and replays that
    /// need a known seating.
    pub fn start_seated(
        &mut self,
        admin: PlayerId,
        roles: Vec<RoleId>,
        settings: GameSettings,
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        if self.closed {
            return Err(GameError::GameClosed(self.code.clone()));
        }
        self.out.clear();
        self.timer = None;
        let (roles, mut rng) = self.prepare_start(admin, roles, &settings)?;
        self.deal(roles, settings, &mut rng, now)?;
        Ok(Outcome {
            envelopes: std::mem::take(&mut self.out),
            timer: self.timer.take(),
        })
    }

    fn prepare_start(
        &self,
        admin: PlayerId,
        roles: Vec<RoleId>,
        settings: &GameSettings,
    ) -> Result<(Vec<RoleId>, GameRng)> {
        self.require_phase(Phase::Lobby)?;
        self.require_admin(admin)?;
        settings.validate()?;

        let players = self.roster.len();
        if players < settings.min_players {
            return Err(GameError::InvalidSetup(format!(
                "need at least {} players, have {players}",
                settings.min_players
            )));
        }

        let mut roles = if roles.is_empty() {
            self.lobby_roles.clone()
        } else {
            roles
        };
        if settings.fill_with_villagers && roles.len() < players {
            roles.resize(players, RoleId::Villager);
        }
        crate::registry::validate_balance(&roles, players)?;

        Ok((roles, GameRng::from_optional_seed(settings.seed)))
    }

    fn deal(
        &mut self,
        roles: Vec<RoleId>,
        settings: GameSettings,
        rng: &mut GameRng,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut registry = PlayerRegistry::initialize(&self.roster, &roles, rng)?;
        if let Some(admin) = self.admin {
            registry.set_status(admin, StatusFlags::ADMIN, true)?;
        }

        self.registry = registry;
        self.prompts = rng.for_context("prompts");
        self.settings = settings;
        self.lobby_roles = roles;
        self.night_number = 0;
        self.achieved.clear();
        self.result = None;
        self.rematch_votes.clear();
        info!(
            game = %self.code,
            players = self.roster.len(),
            mode = ?self.settings.mode,
            seed = rng.seed(),
            "game started"
        );
        self.enter_night(now)
    }

    // === Night ===

    fn enter_night(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.night_number += 1;
        self.registry.clear_status(
            StatusFlags::NIGHTLY | StatusFlags::DEFENDED | StatusFlags::ACTED,
        );
        self.night = Some(NightCollector::new(self.night_number, self.settings.mode));
        self.board = None;
        self.ballot = None;

        let pack = self.registry.living_pack();
        for &member in &pack {
            let teammates = pack
                .iter()
                .filter(|&&id| id != member)
                .filter_map(|&id| self.tag_of(id))
                .collect();
            self.emit_to(member, GameEvent::WolfTeamInfo { teammates });
        }
        self.enter_phase(Phase::Night, now);
        Ok(())
    }

    fn submit_night_action(
        &mut self,
        actor: PlayerId,
        payload: ActionPayload,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_phase(Phase::Night)?;
        let collector = self.night.as_mut().ok_or_else(|| missing("night collector"))?;
        collector.submit(&mut self.registry, actor, payload)?;
        let complete = collector.is_complete(&self.registry);
        self.emit_to(actor, GameEvent::ActionAccepted);
        if complete {
            self.close_night(now)?;
        }
        Ok(())
    }

    fn close_night(&mut self, now: DateTime<Utc>) -> Result<()> {
        let mut collector = self.night.take().ok_or_else(|| missing("night collector"))?;
        let report = resolve(&mut collector, &mut self.registry)?;
        self.night = Some(collector);
        self.announce_night(&report);

        if self.check_win(now)? {
            return Ok(());
        }
        self.enter_accusation(now);
        Ok(())
    }

    fn announce_night(&mut self, report: &NightReport) {
        if let Some((a, b)) = report.lovers {
            for (me, partner) in [(a, b), (b, a)] {
                if let Some(partner) = self.tag_of(partner) {
                    self.emit_to(me, GameEvent::LoverLinked { partner });
                }
            }
        }
        for reading in &report.readings {
            let name = self.name_of(reading.target);
            self.emit_to(
                reading.actor,
                GameEvent::SeerResult {
                    target: reading.target,
                    name,
                    reading: reading.reading,
                },
            );
        }
        self.announce_transformations(&report.transformed);

        let deaths = self.public_deaths(&report.deaths);
        self.emit(GameEvent::NightResult {
            night: report.night,
            deaths,
            survived: report.survivals.len(),
            wolves_disagreed: report.wolves_disagreed,
        });
    }

    // === Day ===

    fn enter_accusation(&mut self, now: DateTime<Utc>) {
        let voters = electorate(&self.registry, self.settings.ghost_mode).len();
        let threshold = self.settings.accusation_threshold_for(voters);
        self.board = Some(AccusationBoard::new(threshold));
        self.ballot = None;
        self.enter_phase(Phase::Accusation, now);
    }

    fn accuse(&mut self, accuser: PlayerId, target: PlayerId, now: DateTime<Utc>) -> Result<()> {
        self.require_phase(Phase::Accusation)?;
        let ghost = self.settings.ghost_mode;
        let board = self.board.as_mut().ok_or_else(|| missing("accusation board"))?;
        let outcome = board.accuse(&self.registry, accuser, target, ghost)?;
        let counts = board.tally();
        debug!(game = %self.code, accuser = %accuser, target = %target, "accusation");
        self.emit(GameEvent::AccusationMade {
            accuser,
            target,
            counts,
        });
        if let AccusationOutcome::Locked(accused) = outcome {
            self.enter_lynch_vote(accused, now);
        }
        Ok(())
    }

    fn vote_to_end_day(&mut self, voter: PlayerId, now: DateTime<Utc>) -> Result<()> {
        self.require_phase(Phase::Accusation)?;
        let ghost = self.settings.ghost_mode;
        let voters = electorate(&self.registry, ghost).len();
        let board = self.board.as_mut().ok_or_else(|| missing("accusation board"))?;
        let done = board.vote_to_end_day(&self.registry, voter, ghost, voters)?;
        let votes = board.end_day_count();
        self.emit(GameEvent::EndDayVoteUpdate {
            votes,
            needed: majority(voters),
        });
        if done {
            info!(game = %self.code, "village voted to end the day");
            self.enter_night(now)?;
        }
        Ok(())
    }

    fn close_accusation(&mut self, now: DateTime<Utc>) -> Result<()> {
        let mayor = self.registry.find_living(RoleId::Mayor).map(|p| p.id);
        let board = self.board.as_mut().ok_or_else(|| missing("accusation board"))?;
        match board.close(mayor) {
            AccusationClose::NoAccusations => {
                info!(game = %self.code, "no accusations; night falls");
                self.enter_night(now)
            }
            AccusationClose::Trial(accused) => {
                self.enter_lynch_vote(accused, now);
                Ok(())
            }
            AccusationClose::Tie(_) if board.restarts() == 0 => {
                board.restart();
                let restarts = board.restarts();
                info!(game = %self.code, "accusations tied; starting over");
                self.emit(GameEvent::AccusationsReset { restarts });
                self.enter_phase(Phase::Accusation, now);
                Ok(())
            }
            AccusationClose::Tie(leaders) => {
                info!(game = %self.code, ?leaders, "accusations deadlocked; night falls");
                self.enter_night(now)
            }
        }
    }

    fn enter_lynch_vote(&mut self, accused: PlayerId, now: DateTime<Utc>) {
        self.ballot = Some(LynchBallot::new(accused));
        self.enter_phase(Phase::LynchVote, now);
        let name = self.name_of(accused);
        info!(game = %self.code, accused = %accused, "trial begins");
        self.emit(GameEvent::LynchVoteStarted {
            accused,
            name,
            timer_ends_at: self.timer_ends_at,
        });
    }

    fn cast_lynch_vote(&mut self, voter: PlayerId, vote: Ballot, now: DateTime<Utc>) -> Result<()> {
        self.require_phase(Phase::LynchVote)?;
        let ghost = self.settings.ghost_mode;
        let voters = electorate(&self.registry, ghost);
        let ballot = self.ballot.as_mut().ok_or_else(|| missing("lynch ballot"))?;
        ballot.cast(&self.registry, voter, vote, ghost)?;
        let complete = ballot.is_complete(&voters);
        self.emit_to(voter, GameEvent::ActionAccepted);
        if complete {
            self.close_lynch(now)?;
        }
        Ok(())
    }

    fn close_lynch(&mut self, now: DateTime<Utc>) -> Result<()> {
        let voters = electorate(&self.registry, self.settings.ghost_mode);
        let mayor = self.registry.find_living(RoleId::Mayor).map(|p| p.id);
        let ballot = self.ballot.take().ok_or_else(|| missing("lynch ballot"))?;
        let tally = ballot.tally(&voters, mayor);
        let accused = tally.accused;
        let name = self.name_of(accused);

        let mut report = PipelineReport::default();
        let message = if tally.lynched() {
            let mut pipeline = DeathPipeline::new(&mut self.registry);
            pipeline.push(Hit::new(accused, DeathCause::Lynch, HitSource::Mob));
            report = pipeline.run()?;
            let shield = report
                .survivals
                .iter()
                .find(|s| s.player == accused)
                .map(|s| s.shield);
            match shield {
                _ if report.died(accused) => format!("{name} was lynched by the village"),
                Some(Shield::Defended) => format!("{name} was defended by the Lawyer and walks free"),
                _ => format!("{name} survived the lynching"),
            }
        } else {
            format!("The village spared {name}")
        };
        info!(
            game = %self.code,
            accused = %accused,
            yes = tally.yes,
            no = tally.no,
            lynched = tally.lynched(),
            "lynch vote closed"
        );

        self.announce_transformations(&report.transformed);
        let deaths = self.public_deaths(&report.deaths);
        self.emit(GameEvent::LynchVoteResult {
            tally,
            lynched: report.died(accused),
            deaths,
            message,
        });

        if self.check_win(now)? {
            return Ok(());
        }
        self.enter_night(now)
    }

    // === Phase control ===

    fn close_phase(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.phase {
            Phase::Night => self.close_night(now),
            Phase::Accusation => self.close_accusation(now),
            Phase::LynchVote => self.close_lynch(now),
            actual @ (Phase::Lobby | Phase::GameOver) => Err(GameError::WrongPhase {
                expected: Phase::Night,
                actual,
            }),
        }
    }

    fn timer_elapsed(&mut self, generation: u64, now: DateTime<Utc>) -> Result<()> {
        if generation != self.timer_generation || !self.phase.in_progress() {
            debug!(game = %self.code, generation, current = self.timer_generation, "stale timer ignored");
            return Ok(());
        }
        info!(game = %self.code, phase = %self.phase, "timer expired");
        self.close_phase(now)
    }

    fn enter_phase(&mut self, phase: Phase, now: DateTime<Utc>) {
        self.phase = phase;
        self.arm_timer(now);
        info!(game = %self.code, phase = %phase, round = self.night_number, "phase started");
        self.emit(GameEvent::PhaseChanged {
            phase,
            round: self.night_number,
            timer_ends_at: self.timer_ends_at,
        });
        self.sync_all();
    }

    /// Invalidate any running countdown and start the one for the current
    /// phase, if it has one.
    fn arm_timer(&mut self, now: DateTime<Utc>) {
        self.timer_generation += 1;
        self.timer_ends_at = None;
        self.timer = None;
        let Some(after) = self
            .phase
            .timed()
            .and_then(|slot| self.settings.timers.duration_for(slot))
        else {
            return;
        };
        self.timer_ends_at = chrono::Duration::from_std(after).ok().map(|d| now + d);
        self.timer = Some(TimerRequest {
            generation: self.timer_generation,
            after,
        });
    }

    // === End of game ===

    /// Run the win evaluator. Returns true if the game ended.
    fn check_win(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let rules = WinRules {
            solo_win_continues: self.settings.solo_win_continues,
            wolves_win_on_parity: self.settings.wolves_win_on_parity,
        };
        let evaluation = evaluate(&self.registry, rules, &self.achieved);
        for winner in evaluation.achievements {
            info!(game = %self.code, ?winner, "solo win recorded");
            self.achieved.push(winner);
            self.emit(GameEvent::SoloAchievement { winner });
        }
        let Some(result) = evaluation.result else {
            return Ok(false);
        };
        info!(game = %self.code, winner = ?result.winner, reason = %result.reason, "game over");
        self.result = Some(result.clone());
        self.night = None;
        self.board = None;
        self.ballot = None;
        self.rematch_votes.clear();
        self.emit(GameEvent::GameOver { result });
        self.enter_phase(Phase::GameOver, now);
        Ok(true)
    }

    fn vote_for_rematch(&mut self, voter: PlayerId) -> Result<()> {
        self.require_phase(Phase::GameOver)?;
        self.require_seated(voter)?;
        if self.admin == Some(voter) {
            info!(game = %self.code, "admin called a rematch");
            self.return_to_lobby();
            return Ok(());
        }
        if !self.rematch_votes.insert(voter) {
            return Err(GameError::not_eligible(voter, Ineligibility::AlreadyVoted));
        }
        let votes = self.rematch_votes.len();
        let needed = majority(self.roster.len());
        self.emit(GameEvent::RematchVoteUpdate { votes, needed });
        if votes >= needed {
            info!(game = %self.code, votes, "rematch agreed");
            self.return_to_lobby();
        }
        Ok(())
    }

    fn return_to_lobby(&mut self) {
        self.phase = Phase::Lobby;
        self.registry = PlayerRegistry::default();
        self.night_number = 0;
        self.night = None;
        self.board = None;
        self.ballot = None;
        self.achieved.clear();
        self.result = None;
        self.rematch_votes.clear();
        self.timer_generation += 1;
        self.timer_ends_at = None;
        self.timer = None;
        self.emit(GameEvent::ReturnToLobby);
        self.emit_lobby();
    }

    fn abort(&mut self) {
        self.closed = true;
        self.phase = Phase::GameOver;
        self.timer_generation += 1;
        self.timer_ends_at = None;
    }

    // === Snapshots ===

    /// What `viewer` may see right now.
    #[must_use]
    pub fn view_for(&self, viewer: PlayerId) -> PlayerView {
        let me = self.registry.get(viewer).ok();
        let game_over = self.phase == Phase::GameOver;

        let you = self.tag_of(viewer).map(|tag| SelfView {
            id: viewer,
            name: tag.name,
            role: me.map(|p| p.role),
            role_name: me.map(|p| p.role.name().to_string()),
            summary: me.map(|p| p.definition().summary.to_string()),
            team: me.map(|p| p.team()),
            alive: me.map_or(true, |p| p.alive),
            admin: self.admin == Some(viewer),
            lover: me.and_then(|p| p.lover),
        });

        let viewer_in_pack = me.is_some_and(|p| p.in_pack());
        let players = self
            .roster
            .iter()
            .map(|tag| {
                let seat = self.registry.get(tag.id).ok();
                let known = seat.is_some_and(|p| {
                    game_over || p.id == viewer || !p.alive || (viewer_in_pack && p.in_pack())
                });
                SeatView {
                    id: tag.id,
                    name: tag.name.clone(),
                    alive: seat.map_or(true, |p| p.alive),
                    role: seat.filter(|_| known).map(|p| p.role),
                }
            })
            .collect();

        PlayerView {
            code: self.code.clone(),
            phase: self.phase,
            round: self.night_number,
            mode: self.settings.mode,
            you,
            players,
            living: self.registry.living_ids(),
            night: self.night_prompt(viewer),
            accusations: self.board.as_ref().map(AccusationBoard::tally).unwrap_or_default(),
            accused: self
                .ballot
                .as_ref()
                .map(LynchBallot::accused)
                .or_else(|| self.board.as_ref().and_then(AccusationBoard::locked)),
            timer_ends_at: self.timer_ends_at,
            timers_disabled: self.settings.timers.disabled,
            lobby_roles: self.lobby_roles.clone(),
            result: self.result.clone(),
        }
    }

    fn night_prompt(&self, viewer: PlayerId) -> Option<NightPrompt> {
        if self.phase != Phase::Night {
            return None;
        }
        let collector = self.night.as_ref()?;
        let player = self.registry.get(viewer).ok().filter(|p| p.alive)?;
        let def = player.definition();
        let submitted = collector.has_submitted(viewer);

        let living = || self.registry.living().map(|p| PlayerTag::new(p.id, p.name.clone()));

        if player.in_pack() {
            return Some(NightPrompt {
                ability: Some(NightAbility::PackKill),
                shape: def.shape,
                prompt: ability_prompt(NightAbility::PackKill).to_string(),
                choices: living().filter(|t| t.id != viewer).collect(),
                submitted,
                decoy: false,
            });
        }
        if let Some(ability) = def.ability.filter(|_| collector.expects(player)) {
            let choices = living()
                .filter(|t| def.allow_self || t.id != viewer)
                .filter(|t| ability != NightAbility::Protect || player.last_protected != Some(t.id))
                .collect();
            return Some(NightPrompt {
                ability: Some(ability),
                shape: def.shape,
                prompt: ability_prompt(ability).to_string(),
                choices,
                submitted,
                decoy: false,
            });
        }
        (self.settings.mode == GameMode::PassAndPlay).then(|| NightPrompt {
            ability: None,
            shape: ActionShape::Single,
            prompt: flavour_prompt(&self.prompts, self.night_number, viewer).to_string(),
            choices: living().filter(|t| t.id != viewer).collect(),
            submitted,
            decoy: true,
        })
    }

    fn sync_all(&mut self) {
        let views: Vec<(PlayerId, PlayerView)> = self
            .roster
            .iter()
            .map(|t| (t.id, self.view_for(t.id)))
            .collect();
        for (id, view) in views {
            self.emit_to(id, GameEvent::GameStateSync { view: Box::new(view) });
        }
    }

    // === Helpers ===

    fn require_phase(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(GameError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn require_admin(&self, player: PlayerId) -> Result<()> {
        if self.admin != Some(player) {
            return Err(GameError::NotAdmin);
        }
        Ok(())
    }

    fn require_seated(&self, player: PlayerId) -> Result<()> {
        if self.roster.iter().any(|t| t.id == player) {
            Ok(())
        } else {
            Err(GameError::UnknownPlayer(player))
        }
    }

    fn tag_of(&self, id: PlayerId) -> Option<PlayerTag> {
        self.roster.iter().find(|t| t.id == id).cloned()
    }

    fn name_of(&self, id: PlayerId) -> String {
        self.tag_of(id).map_or_else(|| id.to_string(), |t| t.name)
    }

    fn public_deaths(&self, deaths: &[crate::effects::Death]) -> Vec<PublicDeath> {
        deaths
            .iter()
            .map(|d| PublicDeath::new(d, self.name_of(d.player)))
            .collect()
    }

    fn announce_transformations(&mut self, transformed: &[PlayerId]) {
        for &id in transformed {
            let role = self.registry.get(id).map_or(RoleId::Werewolf, |p| p.role);
            self.emit_to(id, GameEvent::Transformed { role });
        }
    }

    fn emit(&mut self, event: GameEvent) {
        self.out.push(Envelope::broadcast(event));
    }

    fn emit_to(&mut self, player: PlayerId, event: GameEvent) {
        self.out.push(Envelope::to(player, event));
    }

    fn emit_lobby(&mut self) {
        self.emit(GameEvent::LobbyUpdate {
            code: self.code.clone(),
            players: self.roster.clone(),
            roles: self.lobby_roles.clone(),
        });
    }
}

fn missing(what: &str) -> GameError {
    GameError::Internal(format!("{what} missing for the current phase"))
}
