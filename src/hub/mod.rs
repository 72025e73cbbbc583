//! Directory of running games.
//!
//! `GameHub` is cheap to clone and shared by the transport. Each game runs
//! in its own actor task (see `actor`); games share nothing, so separate
//! games progress in parallel while commands within one game are applied
//! strictly in arrival order.
//!
//! Every envelope a game produces is returned to the sender of the command
//! and also published on a broadcast stream that transports subscribe to.
//!
//! All methods that spawn actors must be called inside a tokio runtime.

mod actor;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::core::GameSettings;
use crate::error::{GameError, Result};
use crate::game::{Command, Envelope, Game};

pub use actor::{GameHandle, Published};

/// Channel sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HubConfig {
    /// Queued commands per game before senders wait.
    pub command_buffer: usize,
    /// Published envelopes a slow subscriber may lag behind.
    pub event_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            event_buffer: 1024,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameHub {
    games: Arc<DashMap<String, GameHandle>>,
    events: broadcast::Sender<Published>,
    config: HubConfig,
}

impl Default for GameHub {
    fn default() -> Self {
        Self::new()
    }
}

impl GameHub {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    #[must_use]
    pub fn with_config(config: HubConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            games: Arc::new(DashMap::new()),
            events,
            config,
        }
    }

    /// Open a lobby under `code`.
    pub fn create_game(&self, code: impl Into<String>, settings: GameSettings) -> Result<GameHandle> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(GameError::InvalidSetup("game code cannot be empty".to_string()));
        }
        settings.validate()?;

        let entry = self.games.entry(code.clone());
        if let dashmap::mapref::entry::Entry::Occupied(existing) = &entry {
            if !existing.get().is_closed() {
                return Err(GameError::InvalidSetup(format!("game code {code} is in use")));
            }
        }
        let game = Game::new(code.clone()).with_settings(settings);
        let handle = actor::spawn(game, self.config.command_buffer.max(1), self.events.clone());
        entry.insert(handle.clone());
        info!(game = %code, "game created");
        Ok(handle)
    }

    pub fn get(&self, code: &str) -> Result<GameHandle> {
        self.games
            .get(code)
            .map(|h| h.value().clone())
            .ok_or_else(|| GameError::GameNotFound(code.to_string()))
    }

    /// Send a command to the game under `code`.
    ///
    /// A game that hits an internal error is dropped from the directory.
    /// A successful lobby reset moves the game to its new code.
    pub async fn send(&self, code: &str, command: Command) -> Result<Vec<Envelope>> {
        let handle = self.get(code)?;
        let new_code = match &command {
            Command::ResetLobby { new_code, .. } => {
                let new_code = new_code.trim().to_string();
                if new_code != code && self.games.contains_key(&new_code) {
                    return Err(GameError::InvalidSetup(format!("game code {new_code} is in use")));
                }
                Some(new_code)
            }
            _ => None,
        };

        match handle.send(command).await {
            Ok(envelopes) => {
                if let Some(new_code) = new_code.filter(|c| c != code) {
                    if let Some((_, handle)) = self.games.remove(code) {
                        self.games.insert(new_code.clone(), handle);
                    }
                    info!(game = %code, new_code = %new_code, "game moved");
                }
                Ok(envelopes)
            }
            Err(err) => {
                if err.is_fatal() || matches!(err, GameError::GameClosed(_)) {
                    warn!(game = %code, error = %err, "removing game");
                    self.games.remove(code);
                }
                Err(err)
            }
        }
    }

    /// Stream of every envelope produced by every game.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.events.subscribe()
    }

    /// Drop a game. Its actor stops once queued commands drain.
    pub fn remove(&self, code: &str) -> bool {
        self.games.remove(code).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.games.iter().map(|e| e.key().clone()).collect();
        codes.sort();
        codes
    }
}
