//! Poll loop that runs a [`JobController`] on its own task.
//!
//! All controller state lives on the driver task; callers talk to it
//! through a cloneable [`ControllerHandle`]. One `tokio::select!` loop
//! owns the poll timer, the single outstanding status query and the
//! stop-acknowledgment deadline, so no two snapshots are ever reconciled
//! concurrently.
//!
//! - A timer tick that fires while a query is outstanding is skipped.
//! - `stop` disarms the timer at once. A query already in flight is
//!   allowed to finish; its result is discarded.
//! - `reset` and a successful `start` drop any query still in flight for
//!   the previous job, so the new job is polled on its own period.

use std::future::pending;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vox_core::artifact::ArtifactKind;
use vox_core::request::JobRequest;
use vox_core::snapshot::JobSnapshot;
use vox_core::types::JobHandle;

use crate::config::ControllerConfig;
use crate::controller::{ControllerState, JobController};
use crate::error::{ControllerError, QueryError};
use crate::events::ControllerEvent;
use crate::view::JobView;

/// Command channel capacity.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, ControllerError>>;

/// A status query that has been issued and not yet reconciled.
type InFlight = (JobHandle, BoxFuture<'static, Result<JobSnapshot, QueryError>>);

enum Command {
    Start {
        request: Box<JobRequest>,
        reply: Reply<JobHandle>,
    },
    Stop {
        reply: Reply<()>,
    },
    Reset {
        reply: Reply<()>,
    },
    FetchArtifact {
        kind: ArtifactKind,
        reply: Reply<Bytes>,
    },
    State {
        reply: Reply<ControllerState>,
    },
    View {
        reply: Reply<JobView>,
    },
}

/// Cloneable handle to a controller running on a driver task.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<ControllerEvent>,
    cancel: CancellationToken,
}

impl ControllerHandle {
    /// Start a job. See [`JobController::start`].
    pub async fn start(&self, request: JobRequest) -> Result<JobHandle, ControllerError> {
        self.call(|reply| Command::Start {
            request: Box::new(request),
            reply,
        })
        .await
    }

    /// Stop polling the running job; the server keeps running it.
    ///
    /// Returns once the timer is disarmed. The state reaches `Stopped`
    /// after the configured acknowledgment delay.
    pub async fn stop(&self) -> Result<(), ControllerError> {
        self.call(|reply| Command::Stop { reply }).await
    }

    /// Discard the current job and return to `Idle`.
    pub async fn reset(&self) -> Result<(), ControllerError> {
        self.call(|reply| Command::Reset { reply }).await
    }

    /// Download an output of the current job.
    pub async fn fetch_artifact(&self, kind: ArtifactKind) -> Result<Bytes, ControllerError> {
        self.call(|reply| Command::FetchArtifact { kind, reply })
            .await
    }

    pub async fn state(&self) -> Result<ControllerState, ControllerError> {
        self.call(|reply| Command::State { reply }).await
    }

    /// Snapshot of the current view.
    pub async fn view(&self) -> Result<JobView, ControllerError> {
        self.call(|reply| Command::View { reply }).await
    }

    /// Subscribe to render/update events.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.event_tx.subscribe()
    }

    /// Ask the driver task to exit. Pending and later calls fail with
    /// [`ControllerError::DriverGone`].
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| ControllerError::DriverGone)?;
        rx.await.map_err(|_| ControllerError::DriverGone)?
    }
}

/// Spawn a driver task for `controller`.
///
/// The task exits when [`ControllerHandle::shutdown`] is called or every
/// handle has been dropped.
pub fn spawn_controller(
    controller: JobController,
    config: ControllerConfig,
) -> (ControllerHandle, tokio::task::JoinHandle<()>) {
    let (commands, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let handle = ControllerHandle {
        commands,
        event_tx: controller.event_sender(),
        cancel: cancel.clone(),
    };

    let task = tokio::spawn(async move {
        Driver::new(controller, config).run(rx, cancel).await;
        tracing::debug!("Controller driver exited");
    });

    (handle, task)
}

/// Scheduling state owned by the driver task.
struct Driver {
    controller: JobController,
    config: ControllerConfig,
    ticker: Option<Interval>,
    in_flight: Option<InFlight>,
    stop_deadline: Option<Instant>,
}

impl Driver {
    fn new(controller: JobController, config: ControllerConfig) -> Self {
        Self {
            controller,
            config,
            ticker: None,
            in_flight: None,
            stop_deadline: None,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },

                (handle, result) = wait_query(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.controller.apply(&handle, result);
                }

                _ = next_tick(&mut self.ticker), if self.ticker.is_some() && self.in_flight.is_none() => {
                    self.in_flight = self.controller.begin_query();
                }

                _ = wait_until(self.stop_deadline), if self.stop_deadline.is_some() => {
                    self.stop_deadline = None;
                    self.controller.finish_stop();
                }
            }

            self.sync_timer();
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { request, reply } => {
                let result = self.controller.start(&request).await;
                if result.is_ok() {
                    self.in_flight = None;
                }
                let _ = reply.send(result);
            }
            Command::Stop { reply } => {
                let result = self.controller.request_stop();
                if result.is_ok() {
                    self.ticker = None;
                    self.stop_deadline = Some(Instant::now() + self.config.stop_ack_delay);
                }
                let _ = reply.send(result);
            }
            Command::Reset { reply } => {
                self.controller.reset();
                self.ticker = None;
                self.in_flight = None;
                self.stop_deadline = None;
                let _ = reply.send(Ok(()));
            }
            Command::FetchArtifact { kind, reply } => {
                let result = self.controller.fetch_artifact(kind).await;
                let _ = reply.send(result);
            }
            Command::State { reply } => {
                let _ = reply.send(Ok(self.controller.state()));
            }
            Command::View { reply } => {
                let _ = reply.send(Ok(self.controller.view().clone()));
            }
        }
    }

    /// Arm the timer while polling, disarm it otherwise.
    fn sync_timer(&mut self) {
        let polling = self.controller.state() == ControllerState::Polling;
        match (polling, self.ticker.is_some()) {
            (true, false) => {
                let period = self.config.poll_interval;
                let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.ticker = Some(ticker);
            }
            (false, true) => self.ticker = None,
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}

async fn wait_query(
    in_flight: &mut Option<InFlight>,
) -> (JobHandle, Result<JobSnapshot, QueryError>) {
    match in_flight {
        Some((handle, query)) => {
            let result = query.await;
            (handle.clone(), result)
        }
        None => pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
