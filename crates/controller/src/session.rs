//! Identity and lifecycle of the one remote job a client tracks.
//!
//! [`JobSession`] knows nothing about timing or rendering. It submits
//! jobs, queries them and downloads their outputs, and refuses to start a
//! second job while one is still active.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use vox_core::artifact::ArtifactKind;
use vox_core::request::JobRequest;
use vox_core::snapshot::{JobSnapshot, JobStatus};
use vox_core::types::JobHandle;

use crate::error::{ArtifactError, QueryError, SubmissionError};
use crate::transport::JobTransport;

/// Per-job bookkeeping.
#[derive(Debug)]
struct TrackedJob {
    handle: JobHandle,
    /// Set once polling has ended, for whatever reason.
    finished: bool,
    /// Set once a snapshot reported `done`.
    succeeded: bool,
}

/// Start/query/download operations for at most one job.
pub struct JobSession {
    transport: Arc<dyn JobTransport>,
    job: Option<TrackedJob>,
}

impl JobSession {
    pub fn new(transport: Arc<dyn JobTransport>) -> Self {
        Self {
            transport,
            job: None,
        }
    }

    /// Handle of the tracked job, active or finished.
    pub fn handle(&self) -> Option<&JobHandle> {
        self.job.as_ref().map(|j| &j.handle)
    }

    /// Whether a job is tracked and has not finished yet.
    pub fn is_active(&self) -> bool {
        self.job.as_ref().is_some_and(|j| !j.finished)
    }

    /// Whether the tracked job reported terminal success.
    pub fn succeeded(&self) -> bool {
        self.job.as_ref().is_some_and(|j| j.succeeded)
    }

    /// Submit `request`, allocating exactly one remote job.
    ///
    /// Fails without any network call while another job is active.
    /// A finished job is replaced.
    pub async fn start(&mut self, request: &JobRequest) -> Result<JobHandle, SubmissionError> {
        if let Some(job) = self.job.as_ref().filter(|j| !j.finished) {
            return Err(SubmissionError::JobActive(job.handle.id().clone()));
        }

        let job_id = self.transport.submit(request).await?;
        let handle = JobHandle::new(job_id);

        tracing::info!(
            job_id = %handle.id(),
            mode = %request.mode(),
            files = request.files().len(),
            "Transcription job created",
        );

        self.job = Some(TrackedJob {
            handle: handle.clone(),
            finished: false,
            succeeded: false,
        });
        Ok(handle)
    }

    /// Fetch the current full state of `handle`'s job.
    pub async fn query(&self, handle: &JobHandle) -> Result<JobSnapshot, QueryError> {
        self.transport.status(handle.id()).await
    }

    /// Same as [`query`](Self::query), but the returned future owns
    /// everything it needs so it can outlive a borrow of the session.
    pub fn query_detached(
        &self,
        handle: &JobHandle,
    ) -> BoxFuture<'static, Result<JobSnapshot, QueryError>> {
        let transport = Arc::clone(&self.transport);
        let job_id = handle.id().clone();
        Box::pin(async move { transport.status(&job_id).await })
    }

    /// Take note of a reconciled snapshot of the tracked job.
    pub fn record(&mut self, snapshot: &JobSnapshot) {
        if let Some(job) = self.job.as_mut() {
            if snapshot.status == JobStatus::Done {
                job.succeeded = true;
            }
        }
    }

    /// Mark the tracked job as no longer polled. The handle is kept so
    /// outputs can still be downloaded.
    pub fn finish(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.finished = true;
        }
    }

    /// Forget the tracked job.
    pub fn clear(&mut self) {
        if let Some(job) = self.job.take() {
            tracing::debug!(job_id = %job.handle.id(), "Session cleared");
        }
    }

    /// Download an output of `handle`'s job.
    ///
    /// Only allowed once a snapshot of that job reported `done`.
    pub async fn fetch_artifact(
        &self,
        handle: &JobHandle,
        kind: ArtifactKind,
    ) -> Result<Bytes, ArtifactError> {
        let job = self
            .job
            .as_ref()
            .filter(|j| j.handle.id() == handle.id())
            .ok_or_else(|| {
                ArtifactError::Unavailable(format!("job {} is not tracked", handle.id()))
            })?;

        if !job.succeeded {
            return Err(ArtifactError::Unavailable(format!(
                "job {} has not completed successfully",
                handle.id()
            )));
        }

        let bytes = self.transport.artifact(handle.id(), kind).await?;
        tracing::info!(job_id = %handle.id(), ?kind, size = bytes.len(), "Artifact downloaded");
        Ok(bytes)
    }
}

impl std::fmt::Debug for JobSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSession").field("job", &self.job).finish()
    }
}
