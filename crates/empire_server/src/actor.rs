//! The engine task and its handle.

use std::time::Duration;

use empire_core::combat::AttackPreview;
use empire_core::prelude::*;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{ServerConfig, ServerError};

/// Work sent to the engine task.
enum Request {
    Apply {
        command: Command,
        reply: oneshot::Sender<CommandResult<CommandOutcome>>,
    },
    Preview {
        target: Coord,
        units: UnitCounts,
        reply: oneshot::Sender<CommandResult<AttackPreview>>,
    },
    Snapshot {
        reply: oneshot::Sender<SaveGame>,
    },
    StateHash {
        reply: oneshot::Sender<u64>,
    },
    Shutdown {
        reply: oneshot::Sender<SaveGame>,
    },
}

/// Cloneable access to a running engine task.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    requests: mpsc::Sender<Request>,
    events: broadcast::Sender<GameEvent>,
}

impl EngineHandle {
    /// Apply a command and wait for its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Command`] if the engine rejected it and
    /// [`ServerError::Closed`] if the task has stopped.
    pub async fn apply(&self, command: Command) -> crate::Result<CommandOutcome> {
        let outcome = self
            .request(|reply| Request::Apply { command, reply })
            .await?;
        Ok(outcome?)
    }

    /// Queue construction or an upgrade.
    ///
    /// # Errors
    ///
    /// See [`EngineHandle::apply`].
    pub async fn start_construction(&self, building: BuildingKind, at: Coord) -> crate::Result<()> {
        self.apply(Command::StartConstruction { building, at })
            .await
            .map(drop)
    }

    /// Queue a training batch.
    ///
    /// # Errors
    ///
    /// See [`EngineHandle::apply`].
    pub async fn start_training(&self, unit: UnitKind, quantity: u32) -> crate::Result<()> {
        self.apply(Command::StartTraining { unit, quantity })
            .await
            .map(drop)
    }

    /// Queue research.
    ///
    /// # Errors
    ///
    /// See [`EngineHandle::apply`].
    pub async fn start_research(&self, tech: TechKey) -> crate::Result<()> {
        self.apply(Command::StartResearch { tech }).await.map(drop)
    }

    /// Advance the engine by `delta` seconds, returning the tick's events.
    ///
    /// # Errors
    ///
    /// See [`EngineHandle::apply`].
    pub async fn tick(&self, delta: Fixed) -> crate::Result<Vec<GameEvent>> {
        match self.apply(Command::Tick { delta }).await? {
            CommandOutcome::Ticked(events) => Ok(events),
            other => Err(ServerError::UnexpectedOutcome(format!("{other:?}"))),
        }
    }

    /// Resolve an attack.
    ///
    /// # Errors
    ///
    /// See [`EngineHandle::apply`].
    pub async fn commit_attack(
        &self,
        target: Coord,
        units: UnitCounts,
    ) -> crate::Result<CombatReport> {
        match self.apply(Command::CommitAttack { target, units }).await? {
            CommandOutcome::Attacked(report) => Ok(report),
            other => Err(ServerError::UnexpectedOutcome(format!("{other:?}"))),
        }
    }

    /// Predict an attack without changing anything.
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection or [`ServerError::Closed`].
    pub async fn preview_attack(
        &self,
        target: Coord,
        units: UnitCounts,
    ) -> crate::Result<AttackPreview> {
        let preview = self
            .request(|reply| Request::Preview {
                target,
                units,
                reply,
            })
            .await?;
        Ok(preview?)
    }

    /// Copy of the current persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Closed`] if the task has stopped.
    pub async fn snapshot(&self) -> crate::Result<SaveGame> {
        self.request(|reply| Request::Snapshot { reply }).await
    }

    /// Current state hash.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Closed`] if the task has stopped.
    pub async fn state_hash(&self) -> crate::Result<u64> {
        self.request(|reply| Request::StateHash { reply }).await
    }

    /// Stop the task, returning the final state. Other handles see
    /// [`ServerError::Closed`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Closed`] if the task had already stopped.
    pub async fn shutdown(&self) -> crate::Result<SaveGame> {
        self.request(|reply| Request::Shutdown { reply }).await
    }

    /// Receive every event produced from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> crate::Result<T> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(make(reply))
            .await
            .map_err(|_| ServerError::Closed)?;
        response.await.map_err(|_| ServerError::Closed)
    }
}

/// Move `engine` into a new task.
///
/// The task runs until [`EngineHandle::shutdown`] is called or every
/// handle is dropped, and then yields the engine back through the join
/// handle. When the config enables the tick driver, the engine also ticks
/// by the interval length on every interval.
///
/// Must be called from within a tokio runtime.
pub fn spawn(engine: Engine, config: &ServerConfig) -> (EngineHandle, JoinHandle<Engine>) {
    let (requests, receiver) = mpsc::channel(config.command_buffer.max(1));
    let (events, _) = broadcast::channel(config.event_buffer.max(1));
    let driver = config.tick_interval().map(|period| {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        (interval, period)
    });

    let task = EngineTask {
        engine,
        events: events.clone(),
    };
    let join = tokio::spawn(task.run(receiver, driver));
    (EngineHandle { requests, events }, join)
}

struct EngineTask {
    engine: Engine,
    events: broadcast::Sender<GameEvent>,
}

impl EngineTask {
    async fn run(
        mut self,
        mut receiver: mpsc::Receiver<Request>,
        mut driver: Option<(Interval, Duration)>,
    ) -> Engine {
        info!(
            turn = self.engine.turn(),
            driver = driver.is_some(),
            "Engine task started"
        );

        loop {
            tokio::select! {
                request = receiver.recv() => {
                    let Some(request) = request else {
                        break;
                    };
                    if !self.handle(request) {
                        break;
                    }
                }
                period = next_tick(&mut driver) => {
                    let delta = empire_core::math::ratio(
                        i64::try_from(period.as_millis()).unwrap_or(i64::MAX),
                        1000,
                    );
                    let events = self.engine.tick(delta);
                    self.publish(events);
                }
            }
        }

        info!(turn = self.engine.turn(), "Engine task stopped");
        self.engine
    }

    /// Serve one request. Returns false once the task should stop.
    fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Apply { command, reply } => {
                debug!(?command, "Applying command");
                let outcome = self.engine.apply(command);
                if let Ok(CommandOutcome::Ticked(events)) = &outcome {
                    self.publish(events.clone());
                }
                let pending = self.engine.drain_events();
                self.publish(pending);
                let _ = reply.send(outcome);
            }
            Request::Preview {
                target,
                units,
                reply,
            } => {
                let _ = reply.send(self.engine.preview_attack(target, &units));
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.engine.save_game());
            }
            Request::StateHash { reply } => {
                let _ = reply.send(self.engine.state_hash());
            }
            Request::Shutdown { reply } => {
                let _ = reply.send(self.engine.save_game());
                return false;
            }
        }
        true
    }

    fn publish(&self, events: Vec<GameEvent>) {
        for event in events {
            // no subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

/// Log every event from `events` until the channel closes, returning how
/// many were logged. Events dropped while lagging are skipped with a
/// warning.
pub async fn log_events(mut events: broadcast::Receiver<GameEvent>) -> u64 {
    let mut logged = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(?event, "Event");
                logged += 1;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event logger lagged; events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    logged
}

async fn next_tick(driver: &mut Option<(Interval, Duration)>) -> Duration {
    match driver {
        Some((interval, period)) => {
            interval.tick().await;
            *period
        }
        None => std::future::pending().await,
    }
}
