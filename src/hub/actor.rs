//! One actor task per game instance.
//!
//! The task owns the `Game` and drains a bounded command queue, so commands
//! for one game never interleave. Commands that arrive while a night is
//! resolving simply wait in the queue.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::{GameError, Result};
use crate::game::{Command, Envelope, Game, TimerRequest};

/// An envelope published on the hub's event stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Published {
    /// Code of the game at the time the envelope was produced.
    pub code: String,
    pub envelope: Envelope,
}

type Reply = oneshot::Sender<Result<Vec<Envelope>>>;

struct Request {
    command: Command,
    /// `None` for timer wake-ups, which nobody waits on.
    reply: Option<Reply>,
}

/// Cheap handle to a running game actor.
#[derive(Clone, Debug)]
pub struct GameHandle {
    code: Arc<str>,
    tx: mpsc::Sender<Request>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("command", &self.command.name())
            .finish_non_exhaustive()
    }
}

impl GameHandle {
    /// Code the game was created under.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether the actor has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Queue a command and wait for its result.
    pub async fn send(&self, command: Command) -> Result<Vec<Envelope>> {
        let (reply, rx) = oneshot::channel();
        let request = Request {
            command,
            reply: Some(reply),
        };
        self.tx
            .send(request)
            .await
            .map_err(|_| GameError::GameClosed(self.code.to_string()))?;
        rx.await
            .map_err(|_| GameError::GameClosed(self.code.to_string()))?
    }
}

/// Start the actor for `game` on the current tokio runtime.
pub(crate) fn spawn(game: Game, buffer: usize, events: broadcast::Sender<Published>) -> GameHandle {
    let code: Arc<str> = Arc::from(game.code());
    let (tx, rx) = mpsc::channel(buffer);
    let actor = Actor {
        game,
        rx,
        wake: tx.downgrade(),
        events,
    };
    let span = info_span!("game", code = %code);
    tokio::spawn(actor.run().instrument(span));
    GameHandle { code, tx }
}

struct Actor {
    game: Game,
    rx: mpsc::Receiver<Request>,
    /// Weak so pending timers do not keep an abandoned game alive.
    wake: mpsc::WeakSender<Request>,
    events: broadcast::Sender<Published>,
}

impl Actor {
    async fn run(mut self) {
        info!("game actor started");
        while let Some(Request { command, reply }) = self.rx.recv().await {
            let name = command.name();
            let result = self.game.handle(command);
            let result = match result {
                Ok(outcome) => {
                    if let Some(timer) = outcome.timer {
                        self.arm(timer);
                    }
                    self.publish(&outcome.envelopes);
                    Ok(outcome.envelopes)
                }
                Err(err) => {
                    warn!(command = name, error = %err, "command rejected");
                    Err(err)
                }
            };
            if let Some(reply) = reply {
                // the caller may have given up waiting
                let _ = reply.send(result);
            }
            if self.game.is_closed() {
                break;
            }
        }
        info!("game actor stopped");
    }

    fn publish(&self, envelopes: &[Envelope]) {
        for envelope in envelopes {
            // no subscribers is fine
            let _ = self.events.send(Published {
                code: self.game.code().to_string(),
                envelope: envelope.clone(),
            });
        }
    }

    fn arm(&self, timer: TimerRequest) {
        let wake = self.wake.clone();
        debug!(generation = timer.generation, after = ?timer.after, "timer armed");
        tokio::spawn(async move {
            tokio::time::sleep(timer.after).await;
            if let Some(tx) = wake.upgrade() {
                let request = Request {
                    command: Command::TimerElapsed {
                        generation: timer.generation,
                    },
                    reply: None,
                };
                let _ = tx.send(request).await;
            }
        });
    }
}
