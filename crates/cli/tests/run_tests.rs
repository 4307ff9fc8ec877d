//! Integration tests for `vox run` job following.
//!
//! Drives [`follow_job`] against a scripted transport on a paused clock
//! and checks the rendered output and the saved files.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use vox_cli::cli::OutputChoice;
use vox_cli::commands::{follow_job, DownloadPlan};
use vox_cli::indicator::ActivityIndicator;
use vox_cli::render::Renderer;
use vox_controller::config::ControllerConfig;
use vox_controller::controller::ControllerState;
use vox_controller::error::{ArtifactError, QueryError, SubmissionError};
use vox_controller::transport::JobTransport;
use vox_core::artifact::{ArtifactKind, TextKind};
use vox_core::request::{InputFile, JobMode, JobRequest, OutputKind};
use vox_core::snapshot::{FileState, FileStatus, JobSnapshot, JobStatus};
use vox_core::types::JobId;

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

struct ScriptedServer {
    statuses: Mutex<VecDeque<JobSnapshot>>,
    queries: AtomicUsize,
    downloads: Mutex<Vec<ArtifactKind>>,
    submit_delay: Option<Duration>,
}

impl ScriptedServer {
    fn new(statuses: Vec<JobSnapshot>) -> Arc<Self> {
        Self::build(statuses, None)
    }

    /// Submissions take `delay`, like a large upload.
    fn slow_upload(statuses: Vec<JobSnapshot>, delay: Duration) -> Arc<Self> {
        Self::build(statuses, Some(delay))
    }

    fn build(statuses: Vec<JobSnapshot>, submit_delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            queries: AtomicUsize::new(0),
            downloads: Mutex::new(Vec::new()),
            submit_delay,
        })
    }
}

#[async_trait]
impl JobTransport for ScriptedServer {
    async fn submit(&self, _request: &JobRequest) -> Result<JobId, SubmissionError> {
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(JobId::new("42"))
    }

    async fn status(&self, _job_id: &JobId) -> Result<JobSnapshot, QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        // The last snapshot repeats once the script is exhausted.
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(statuses.front().cloned().unwrap())
        }
    }

    async fn artifact(&self, _job_id: &JobId, kind: ArtifactKind) -> Result<Bytes, ArtifactError> {
        self.downloads.lock().unwrap().push(kind);
        Ok(Bytes::from_static(b"contents"))
    }
}

fn snapshot(status: JobStatus, logs: &[&str], file: FileState, use_api: bool) -> JobSnapshot {
    JobSnapshot {
        status,
        progress: if status.is_terminal() { 1.0 } else { 0.5 },
        files: vec![FileStatus {
            name: "a.mp3".into(),
            status: file,
            progress: if file == FileState::Done { 1.0 } else { 0.5 },
            out_path: (file == FileState::Done).then(|| "/srv/out/a.txt".to_string()),
            error: None,
        }],
        logs: logs.iter().map(|s| s.to_string()).collect(),
        use_api,
        output_type: use_api.then(|| "compte_rendu".to_string()),
        model: None,
        lang: None,
        created_at: None,
    }
}

fn local_request() -> JobRequest {
    JobRequest::builder(JobMode::Local, "Small", "Anglais")
        .file(InputFile::new("a.mp3", &b"ID3"[..]))
        .build()
        .unwrap()
}

fn plan(output: Option<OutputChoice>, dir: &Path) -> DownloadPlan {
    DownloadPlan {
        output,
        merge: true,
        out_dir: dir.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn completed_job_is_rendered_and_downloaded() {
    let server = ScriptedServer::new(vec![
        snapshot(JobStatus::Processing, &["start"], FileState::Processing, false),
        snapshot(JobStatus::Done, &["start", "done"], FileState::Done, false),
    ]);
    let tmp = tempfile::tempdir().unwrap();
    let mut renderer = Renderer::new(Vec::new());
    let mut indicator = ActivityIndicator::with_drawing(false);

    let outcome = follow_job(
        server.clone(),
        ControllerConfig::default(),
        local_request(),
        &plan(Some(OutputChoice::Archive), tmp.path()),
        &mut renderer,
        &mut indicator,
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.state, ControllerState::Completed);
    assert_eq!(outcome.job_id, JobId::new("42"));
    assert_eq!(outcome.saved, [tmp.path().join("transcriptions_42.zip")]);
    assert_eq!(std::fs::read(&outcome.saved[0]).unwrap(), b"contents");
    assert!(!indicator.is_running());

    let out = String::from_utf8(renderer.into_inner()).unwrap();
    assert!(out.starts_with("Job 42 started\n"));
    assert_eq!(out.matches("  | start\n").count(), 1);
    assert_eq!(out.matches("  | done\n").count(), 1);
    assert!(out.contains("-> a.txt"));
    assert!(out.ends_with("Job completed\n"));
}

#[tokio::test(start_paused = true)]
async fn summary_is_named_after_the_output_type() {
    let server = ScriptedServer::new(vec![snapshot(JobStatus::Done, &[], FileState::Done, true)]);
    let tmp = tempfile::tempdir().unwrap();
    let request = JobRequest::builder(JobMode::Remote, "whisper-1", "Français")
        .credential("sk-test")
        .output_kind(OutputKind::CompteRendu)
        .file(InputFile::new("a.mp3", &b"ID3"[..]))
        .build()
        .unwrap();

    let outcome = follow_job(
        server.clone(),
        ControllerConfig::default(),
        request,
        &plan(Some(OutputChoice::Summary), tmp.path()),
        &mut Renderer::new(Vec::new()),
        &mut ActivityIndicator::with_drawing(false),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.saved, [tmp.path().join("compte_rendu_42.txt")]);
    assert_eq!(
        server.downloads.lock().unwrap().as_slice(),
        [ArtifactKind::Text {
            kind: TextKind::Summary,
            merge: true
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn local_job_skips_summary_download() {
    let server = ScriptedServer::new(vec![snapshot(JobStatus::Done, &[], FileState::Done, false)]);
    let tmp = tempfile::tempdir().unwrap();

    let outcome = follow_job(
        server.clone(),
        ControllerConfig::default(),
        local_request(),
        &plan(Some(OutputChoice::Summary), tmp.path()),
        &mut Renderer::new(Vec::new()),
        &mut ActivityIndicator::with_drawing(false),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.state, ControllerState::Completed);
    assert!(outcome.saved.is_empty());
    assert!(server.downloads.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn interrupt_stops_following_without_downloading() {
    let server = ScriptedServer::new(vec![snapshot(
        JobStatus::Processing,
        &["working"],
        FileState::Processing,
        false,
    )]);
    let tmp = tempfile::tempdir().unwrap();
    let mut renderer = Renderer::new(Vec::new());

    let outcome = follow_job(
        server.clone(),
        ControllerConfig::default(),
        local_request(),
        &plan(Some(OutputChoice::Archive), tmp.path()),
        &mut renderer,
        &mut ActivityIndicator::with_drawing(false),
        tokio::time::sleep(Duration::from_millis(2500)),
    )
    .await
    .unwrap();

    assert_eq!(outcome.state, ControllerState::Stopped);
    assert!(outcome.saved.is_empty());
    assert_eq!(server.queries.load(Ordering::SeqCst), 2);

    let out = String::from_utf8(renderer.into_inner()).unwrap();
    assert!(out.contains("keeps running on the server"));
    assert!(out.ends_with("Stopped following the job\n"));
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_upload_abandons_the_start() {
    let server = ScriptedServer::slow_upload(
        vec![snapshot(JobStatus::Processing, &[], FileState::Pending, false)],
        Duration::from_secs(60),
    );
    let tmp = tempfile::tempdir().unwrap();
    let mut indicator = ActivityIndicator::with_drawing(false);

    let result = follow_job(
        server.clone(),
        ControllerConfig::default(),
        local_request(),
        &plan(Some(OutputChoice::Archive), tmp.path()),
        &mut Renderer::new(Vec::new()),
        &mut indicator,
        tokio::time::sleep(Duration::from_millis(500)),
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Interrupted during submission"));
    assert!(!indicator.is_running());
    assert_eq!(server.queries.load(Ordering::SeqCst), 0);
}
