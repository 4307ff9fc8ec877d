//! Integration tests for [`JobSession`]: one active job at a time and
//! artifact gating.

mod common;

use assert_matches::assert_matches;
use common::{request, snapshot, FakeTransport};
use vox_controller::error::{ArtifactError, SubmissionError};
use vox_controller::session::JobSession;
use vox_core::artifact::ArtifactKind;
use vox_core::snapshot::JobStatus;
use vox_core::types::{JobHandle, JobId};

#[tokio::test]
async fn start_tracks_the_new_job() {
    let fake = FakeTransport::new().into_arc();
    let mut session = JobSession::new(fake.clone());

    let handle = session.start(&request()).await.unwrap();

    assert_eq!(handle.id(), &JobId::new("job-1"));
    assert_eq!(session.handle(), Some(&handle));
    assert!(session.is_active());
    assert!(!session.succeeded());
    assert_eq!(fake.submits(), 1);
}

#[tokio::test]
async fn second_start_while_active_is_refused_without_submitting() {
    let fake = FakeTransport::new().into_arc();
    let mut session = JobSession::new(fake.clone());
    session.start(&request()).await.unwrap();

    let err = session.start(&request()).await.unwrap_err();

    assert_matches!(err, SubmissionError::JobActive(id) if id == JobId::new("job-1"));
    assert_eq!(fake.submits(), 1);
}

#[tokio::test]
async fn finished_job_can_be_replaced() {
    let fake = FakeTransport::new().into_arc();
    let mut session = JobSession::new(fake);
    session.start(&request()).await.unwrap();
    session.finish();

    let next = session.start(&request()).await.unwrap();
    assert_eq!(next.id(), &JobId::new("job-2"));
}

#[tokio::test]
async fn failed_submission_tracks_nothing() {
    let fake = FakeTransport::new()
        .with_submit_error(SubmissionError::Transport("refused".into()))
        .into_arc();
    let mut session = JobSession::new(fake);

    assert_matches!(
        session.start(&request()).await,
        Err(SubmissionError::Transport(_))
    );
    assert!(session.handle().is_none());
    assert!(!session.is_active());
}

#[tokio::test]
async fn artifact_requires_a_done_snapshot() {
    let fake = FakeTransport::new().with_artifact(b"hello").into_arc();
    let mut session = JobSession::new(fake);
    let handle = session.start(&request()).await.unwrap();

    assert_matches!(
        session.fetch_artifact(&handle, ArtifactKind::Archive).await,
        Err(ArtifactError::Unavailable(_))
    );

    session.record(&snapshot(JobStatus::Processing, &[], vec![]));
    assert!(!session.succeeded());

    session.record(&snapshot(JobStatus::Done, &[], vec![]));
    assert!(session.succeeded());
    let bytes = session
        .fetch_artifact(&handle, ArtifactKind::Archive)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"hello");
}

#[tokio::test]
async fn artifact_for_untracked_job_is_unavailable() {
    let fake = FakeTransport::new().with_artifact(b"hello").into_arc();
    let session = JobSession::new(fake);
    let stranger = JobHandle::new(JobId::new("other"));

    assert_matches!(
        session.fetch_artifact(&stranger, ArtifactKind::Archive).await,
        Err(ArtifactError::Unavailable(_))
    );
}

#[tokio::test]
async fn clear_forgets_the_job() {
    let fake = FakeTransport::new().into_arc();
    let mut session = JobSession::new(fake);
    session.start(&request()).await.unwrap();

    session.clear();

    assert!(session.handle().is_none());
    assert!(!session.is_active());
}
