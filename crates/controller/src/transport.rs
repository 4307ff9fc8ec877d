//! Transport seam between the session and the transcription server.
//!
//! [`JobTransport`] is what [`JobSession`](crate::session::JobSession)
//! talks to. The production implementation is
//! [`TranscribeApi`]; tests substitute scripted fakes.

use async_trait::async_trait;
use bytes::Bytes;
use vox_client::api::{ApiError, TranscribeApi};
use vox_core::artifact::ArtifactKind;
use vox_core::request::JobRequest;
use vox_core::snapshot::JobSnapshot;
use vox_core::types::JobId;

use crate::error::{ArtifactError, QueryError, SubmissionError};

/// Remote job operations, with errors already mapped to the
/// controller's taxonomy.
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Create a remote job and return its id.
    async fn submit(&self, request: &JobRequest) -> Result<JobId, SubmissionError>;

    /// Fetch the full current state of a job.
    async fn status(&self, job_id: &JobId) -> Result<JobSnapshot, QueryError>;

    /// Download a completed output.
    async fn artifact(&self, job_id: &JobId, kind: ArtifactKind) -> Result<Bytes, ArtifactError>;
}

#[async_trait]
impl JobTransport for TranscribeApi {
    async fn submit(&self, request: &JobRequest) -> Result<JobId, SubmissionError> {
        let response = TranscribeApi::submit(self, request)
            .await
            .map_err(|e| match e {
                ApiError::Status { status, body } => SubmissionError::Rejected {
                    status,
                    message: body,
                },
                ApiError::Request(e) => SubmissionError::Transport(e.to_string()),
                ApiError::Decode(e) => SubmissionError::MalformedResponse(e.to_string()),
            })?;

        if response.job_id.as_str().is_empty() {
            return Err(SubmissionError::MalformedResponse(
                "empty job_id".to_string(),
            ));
        }
        Ok(response.job_id)
    }

    async fn status(&self, job_id: &JobId) -> Result<JobSnapshot, QueryError> {
        TranscribeApi::status(self, job_id).await.map_err(|e| match e {
            ApiError::Status { status: 404, .. } => QueryError::NotFound(job_id.clone()),
            ApiError::Status { body, .. } => QueryError::TransportFailure(body),
            ApiError::Request(e) => QueryError::TransportFailure(e.to_string()),
            ApiError::Decode(e) => QueryError::MalformedResponse(e.to_string()),
        })
    }

    async fn artifact(&self, job_id: &JobId, kind: ArtifactKind) -> Result<Bytes, ArtifactError> {
        let result = match kind {
            ArtifactKind::Archive => self.download_archive(job_id).await,
            ArtifactKind::Text { kind, merge } => self.download_text(job_id, kind, merge).await,
        };

        result.map_err(|e| match e {
            ApiError::Status { status, body } if (400..500).contains(&status) => {
                ArtifactError::Unavailable(body)
            }
            other => ArtifactError::Transport(other.to_string()),
        })
    }
}
