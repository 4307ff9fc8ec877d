//! Job lifecycle state machine.
//!
//! ```text
//! Idle -> Starting -> Polling -> Completed
//!   ^        |           |-----> Failed
//!   |        |           `-----> Stopping -> Stopped
//!   |        `-> Idle (submission error)
//!   `------------------ reset --------------'
//! ```
//!
//! [`JobController`] does no scheduling of its own: each call to
//! [`tick`](JobController::tick) (or [`apply`](JobController::apply) with
//! an externally awaited query) runs exactly one poll. The
//! [`driver`](crate::driver) supplies the timer.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::broadcast;
use vox_core::artifact::ArtifactKind;
use vox_core::request::JobRequest;
use vox_core::snapshot::{JobSnapshot, JobStatus};
use vox_core::types::JobHandle;

use crate::error::{ArtifactError, ControllerError, QueryError};
use crate::events::ControllerEvent;
use crate::session::JobSession;
use crate::transport::JobTransport;
use crate::view::{reconcile, JobView};

/// Broadcast channel capacity for controller events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    Starting,
    Polling,
    /// Stop acknowledged, waiting out the acknowledgment delay.
    Stopping,
    Stopped,
    Completed,
    Failed,
}

impl ControllerState {
    /// `Stopped`, `Completed` and `Failed`: no automatic transition follows.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Failed)
    }

    /// A job is in flight and a new one may not start.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Starting | Self::Polling | Self::Stopping)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Polling => "polling",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not polling; nothing was queried.
    Idle,
    /// The result arrived for a job that is no longer polled and was dropped.
    Discarded,
    /// Snapshot reconciled, job still running.
    Continue,
    Completed,
    Failed,
}

/// The job lifecycle controller.
pub struct JobController {
    session: JobSession,
    state: ControllerState,
    view: JobView,
    event_tx: broadcast::Sender<ControllerEvent>,
}

impl JobController {
    pub fn new(transport: Arc<dyn JobTransport>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: JobSession::new(transport),
            state: ControllerState::Idle,
            view: JobView::default(),
            event_tx,
        }
    }

    /// Subscribe to render/update events.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<ControllerEvent> {
        self.event_tx.clone()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn view(&self) -> &JobView {
        &self.view
    }

    /// Handle of the current job, if any.
    pub fn handle(&self) -> Option<&JobHandle> {
        self.session.handle()
    }

    /// Start a job.
    ///
    /// Rejected with [`ControllerError::Busy`] while another job is
    /// starting, polling or stopping; the active job is left untouched.
    /// From a terminal state the previous job is reset first. On a
    /// submission failure the controller returns to `Idle` and reports
    /// one error event.
    pub async fn start(&mut self, request: &JobRequest) -> Result<JobHandle, ControllerError> {
        if self.state.is_busy() {
            tracing::warn!(state = %self.state, "Start rejected, a job is already running");
            return Err(ControllerError::Busy(self.state));
        }
        if self.state.is_terminal() {
            self.reset();
        }

        self.transition(ControllerState::Starting);

        match self.session.start(request).await {
            Ok(handle) => {
                self.view = JobView::for_job(handle.id().clone());
                self.emit(ControllerEvent::JobStarted {
                    job_id: handle.id().clone(),
                });
                self.transition(ControllerState::Polling);
                Ok(handle)
            }
            Err(e) => {
                tracing::error!(error = %e, "Job submission failed");
                self.report_error(format!("Failed to start: {e}"));
                self.transition(ControllerState::Idle);
                Err(e.into())
            }
        }
    }

    /// Run one poll: query the job and reconcile the answer.
    pub async fn tick(&mut self) -> TickOutcome {
        let Some(handle) = self.poll_target().cloned() else {
            return TickOutcome::Idle;
        };
        let result = self.session.query(&handle).await;
        self.apply(&handle, result)
    }

    /// The handle to query next, only while polling.
    pub fn poll_target(&self) -> Option<&JobHandle> {
        match self.state {
            ControllerState::Polling => self.session.handle(),
            _ => None,
        }
    }

    /// Begin a poll whose future does not borrow the controller.
    ///
    /// Feed the outcome back through [`apply`](Self::apply).
    pub fn begin_query(
        &self,
    ) -> Option<(JobHandle, BoxFuture<'static, Result<JobSnapshot, QueryError>>)> {
        let handle = self.poll_target()?.clone();
        let query = self.session.query_detached(&handle);
        Some((handle, query))
    }

    /// Reconcile the result of a query issued for `handle`.
    ///
    /// Results for a job that is no longer being polled (stopped, reset,
    /// replaced) are discarded without touching any state.
    pub fn apply(
        &mut self,
        handle: &JobHandle,
        result: Result<JobSnapshot, QueryError>,
    ) -> TickOutcome {
        let current = self.poll_target().map(|h| h.id());
        if current != Some(handle.id()) {
            tracing::debug!(
                job_id = %handle.id(),
                state = %self.state,
                "Discarding late status result",
            );
            return TickOutcome::Discarded;
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(e),
        };

        let reconciled = match reconcile(&self.view, &snapshot) {
            Ok(reconciled) => reconciled,
            Err(e) => return self.fail(QueryError::MalformedResponse(e.to_string())),
        };

        if !reconciled.new_lines.is_empty() {
            self.emit(ControllerEvent::LogLines {
                lines: reconciled.new_lines,
            });
        }
        if reconciled.files_changed {
            self.emit(ControllerEvent::FilesUpdated {
                files: reconciled.view.files.clone(),
            });
        }
        self.emit(ControllerEvent::Progress {
            fraction: reconciled.view.progress,
            status: snapshot.status,
        });

        self.view = reconciled.view;
        self.session.record(&snapshot);

        tracing::debug!(
            job_id = %handle.id(),
            status = %snapshot.status,
            progress = snapshot.progress,
            cursor = self.view.cursor.position(),
            "Snapshot reconciled",
        );

        match snapshot.status {
            JobStatus::Done => {
                tracing::info!(job_id = %handle.id(), "Job completed");
                self.session.finish();
                self.transition(ControllerState::Completed);
                TickOutcome::Completed
            }
            JobStatus::Error => {
                tracing::warn!(job_id = %handle.id(), "Job reported an error");
                self.session.finish();
                let detail = self
                    .view
                    .log
                    .last()
                    .cloned()
                    .unwrap_or_else(|| "no details".to_string());
                self.report_error(format!("Job failed on the server: {detail}"));
                self.transition(ControllerState::Failed);
                TickOutcome::Failed
            }
            JobStatus::Pending | JobStatus::Processing => TickOutcome::Continue,
        }
    }

    /// Stop tracking the running job.
    ///
    /// Local only: the server keeps running the job. Moves to `Stopping`
    /// immediately; call [`finish_stop`](Self::finish_stop) once the
    /// acknowledgment delay has elapsed.
    pub fn request_stop(&mut self) -> Result<(), ControllerError> {
        if self.state != ControllerState::Polling {
            return Err(ControllerError::NotPolling(self.state));
        }
        if let Some(handle) = self.session.handle() {
            tracing::info!(
                job_id = %handle.id(),
                "Stop requested; the server job keeps running",
            );
        }
        self.session.finish();
        self.transition(ControllerState::Stopping);
        self.emit(ControllerEvent::StopRequested);
        Ok(())
    }

    /// Complete a stop started by [`request_stop`](Self::request_stop).
    pub fn finish_stop(&mut self) {
        if self.state == ControllerState::Stopping {
            self.transition(ControllerState::Stopped);
        }
    }

    /// Drop the current job, its view and its log cursor, back to `Idle`.
    ///
    /// Also abandons a job that is still polling or stopping.
    pub fn reset(&mut self) {
        self.session.clear();
        self.view = JobView::default();
        self.transition(ControllerState::Idle);
    }

    /// Download an output of the current job.
    ///
    /// Fails with [`ArtifactError::Unavailable`] until the job has
    /// completed successfully. Never changes the controller state.
    pub async fn fetch_artifact(&self, kind: ArtifactKind) -> Result<Bytes, ControllerError> {
        let handle = self
            .session
            .handle()
            .ok_or_else(|| ArtifactError::Unavailable("no job has been started".to_string()))?;
        Ok(self.session.fetch_artifact(handle, kind).await?)
    }

    // ---- private helpers ----

    /// Polling failed: go to `Failed` and report one error.
    fn fail(&mut self, error: QueryError) -> TickOutcome {
        tracing::error!(error = %error, "Status polling failed");
        self.session.finish();
        self.report_error(error.to_string());
        self.transition(ControllerState::Failed);
        TickOutcome::Failed
    }

    fn transition(&mut self, to: ControllerState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!(%from, %to, "Controller state changed");
        self.emit(ControllerEvent::StateChanged { from, to });
    }

    fn report_error(&self, message: String) {
        self.emit(ControllerEvent::Error { message });
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}
