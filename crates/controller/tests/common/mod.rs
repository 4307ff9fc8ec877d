//! Scripted transport shared by the controller integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use vox_controller::error::{ArtifactError, QueryError, SubmissionError};
use vox_controller::events::ControllerEvent;
use vox_controller::transport::JobTransport;
use vox_core::artifact::ArtifactKind;
use vox_core::request::{InputFile, JobMode, JobRequest};
use vox_core::snapshot::{FileState, FileStatus, JobSnapshot, JobStatus};
use vox_core::types::JobId;

pub type StatusResult = Result<JobSnapshot, QueryError>;

/// A [`JobTransport`] that replays scripted answers.
///
/// Status answers are consumed in order; once the script runs out the
/// last answer repeats. Submissions succeed with `job-1`, `job-2`, ...
/// unless a submission error is scripted.
#[derive(Default)]
pub struct FakeTransport {
    statuses: Mutex<VecDeque<StatusResult>>,
    last_status: Mutex<Option<StatusResult>>,
    submit_error: Mutex<Option<SubmissionError>>,
    artifact: Mutex<Option<Bytes>>,
    delay: Option<Duration>,
    submits: AtomicUsize,
    queries: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = StatusResult>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into_iter().collect();
        self
    }

    pub fn with_submit_error(self, error: SubmissionError) -> Self {
        *self.submit_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_artifact(self, bytes: &'static [u8]) -> Self {
        *self.artifact.lock().unwrap() = Some(Bytes::from_static(bytes));
        self
    }

    /// Every status query takes `delay` to answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Highest number of status queries ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> StatusResult {
        let scripted = self.statuses.lock().unwrap().pop_front();
        let mut last = self.last_status.lock().unwrap();
        match scripted {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last
                .clone()
                .unwrap_or_else(|| Ok(snapshot(JobStatus::Pending, &[], vec![]))),
        }
    }
}

#[async_trait]
impl JobTransport for FakeTransport {
    async fn submit(&self, _request: &JobRequest) -> Result<JobId, SubmissionError> {
        if let Some(error) = self.submit_error.lock().unwrap().clone() {
            return Err(error);
        }
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(JobId::new(format!("job-{n}")))
    }

    async fn status(&self, _job_id: &JobId) -> Result<JobSnapshot, QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.next_status();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn artifact(&self, job_id: &JobId, _kind: ArtifactKind) -> Result<Bytes, ArtifactError> {
        self.artifact
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ArtifactError::Unavailable(format!("no output for {job_id}")))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn snapshot(status: JobStatus, logs: &[&str], files: Vec<FileStatus>) -> JobSnapshot {
    JobSnapshot {
        status,
        progress: match status {
            JobStatus::Done | JobStatus::Error => 1.0,
            _ => 0.5,
        },
        files,
        logs: logs.iter().map(|s| s.to_string()).collect(),
        use_api: false,
        output_type: None,
        model: None,
        lang: None,
        created_at: None,
    }
}

pub fn file(name: &str, status: FileState, progress: f64, out_path: Option<&str>) -> FileStatus {
    FileStatus {
        name: name.to_string(),
        status,
        progress,
        out_path: out_path.map(str::to_string),
        error: None,
    }
}

/// A valid local-mode request for one file.
pub fn request() -> JobRequest {
    JobRequest::builder(JobMode::Local, "Large v3 (CPU lourd)", "Français")
        .file(InputFile::new("a.mp3", &b"ID3"[..]))
        .build()
        .expect("valid request")
}

/// Every event currently queued on `rx`.
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<ControllerEvent>) -> Vec<ControllerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn error_count(events: &[ControllerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ControllerEvent::Error { .. }))
        .count()
}
