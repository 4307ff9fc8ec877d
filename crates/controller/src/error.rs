use vox_core::types::JobId;

use crate::controller::ControllerState;

/// The server did not accept a job; no job id exists, nothing to clean up.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmissionError {
    /// The session already tracks a running job.
    #[error("Job {0} is still active")]
    JobActive(JobId),

    /// The server answered with a non-success status.
    #[error("Server rejected the job ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never got an answer.
    #[error("Could not reach the server: {0}")]
    Transport(String),

    /// The server accepted the job but the reply carried no usable job id.
    #[error("Malformed submission response: {0}")]
    MalformedResponse(String),
}

/// A status poll failed; polling cannot continue.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("Job {0} not found on the server")]
    NotFound(JobId),

    #[error("Status request failed: {0}")]
    TransportFailure(String),

    #[error("Malformed status response: {0}")]
    MalformedResponse(String),
}

/// An output could not be downloaded. Never changes controller state.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArtifactError {
    /// The job has not finished successfully, or the server has no such
    /// output.
    #[error("Artifact unavailable: {0}")]
    Unavailable(String),

    #[error("Download failed: {0}")]
    Transport(String),
}

/// Errors surfaced by [`JobController`](crate::controller::JobController)
/// and [`ControllerHandle`](crate::driver::ControllerHandle).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// A job is starting, polling or stopping; stop or reset first.
    #[error("A job is already running (state: {0})")]
    Busy(ControllerState),

    /// Stop only applies while polling.
    #[error("Not polling (state: {0})")]
    NotPolling(ControllerState),

    /// The driver task has exited.
    #[error("Controller task is no longer running")]
    DriverGone,
}
