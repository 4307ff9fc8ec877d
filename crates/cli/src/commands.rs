//! Subcommand implementations.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::sync::broadcast::error::RecvError;
use vox_client::api::TranscribeApi;
use vox_controller::config::ControllerConfig;
use vox_controller::controller::{ControllerState, JobController};
use vox_controller::driver::{spawn_controller, ControllerHandle};
use vox_controller::events::ControllerEvent;
use vox_controller::transport::JobTransport;
use vox_controller::view::{reconcile, JobView};
use vox_core::catalog;
use vox_core::request::{InputFile, JobMode, JobRequest, OutputKind, OUTPUT_KINDS};
use vox_core::snapshot::JobStatus;
use vox_core::types::JobId;

use crate::artifacts;
use crate::cli::{DownloadArgs, OutputChoice, RunArgs, StatusArgs};
use crate::config::resolve_credential;
use crate::indicator::ActivityIndicator;
use crate::render::Renderer;

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// What to do once a followed job completes.
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub output: Option<OutputChoice>,
    pub merge: bool,
    pub out_dir: PathBuf,
}

/// How a followed job ended.
#[derive(Debug)]
pub struct RunOutcome {
    pub job_id: JobId,
    pub state: ControllerState,
    pub saved: Vec<PathBuf>,
}

/// `vox run`: submit, follow until the job ends, download outputs.
pub async fn run(
    api: TranscribeApi,
    controller: ControllerConfig,
    args: RunArgs,
) -> anyhow::Result<()> {
    let credential = if args.mode.is_remote() {
        resolve_credential(args.api_key.clone())
    } else {
        None
    };
    let files = read_inputs(&args.files).await?;
    let request = build_request(&args, credential, files)?;

    let plan = DownloadPlan {
        output: args.download.output(),
        merge: !args.no_merge,
        out_dir: args.out.clone(),
    };
    let mut renderer = Renderer::new(std::io::stdout());
    let mut indicator = if args.no_indicator {
        ActivityIndicator::with_drawing(false)
    } else {
        ActivityIndicator::new()
    };

    let outcome = follow_job(
        Arc::new(api),
        controller,
        request,
        &plan,
        &mut renderer,
        &mut indicator,
        interrupted(),
    )
    .await?;

    for path in &outcome.saved {
        println!("Saved {}", path.display());
    }
    match outcome.state {
        ControllerState::Completed | ControllerState::Stopped => Ok(()),
        state => bail!("Job {} ended as {state}", outcome.job_id),
    }
}

/// Start `request` and render its events until the job ends.
///
/// `interrupt` resolving requests a stop; polling ceases and the server
/// job is left running. An interrupt during submission abandons the
/// start.
pub async fn follow_job<W: Write>(
    transport: Arc<dyn JobTransport>,
    config: ControllerConfig,
    request: JobRequest,
    plan: &DownloadPlan,
    renderer: &mut Renderer<W>,
    indicator: &mut ActivityIndicator,
    interrupt: impl Future<Output = ()>,
) -> anyhow::Result<RunOutcome> {
    let (handle, task) = spawn_controller(JobController::new(transport), config);
    let mut events = handle.subscribe();
    tokio::pin!(interrupt);

    let started = tokio::select! {
        started = handle.start(request) => started,
        _ = &mut interrupt => {
            handle.shutdown();
            bail!("Interrupted during submission; the job may still be created on the server");
        }
    };
    let job = started.context("Failed to start the job")?;
    indicator.start();

    let state = watch(&handle, &mut events, renderer, interrupt).await;
    indicator.stop().await;
    let state = state?;

    let saved = if state == ControllerState::Completed {
        download_outputs(&handle, plan).await?
    } else {
        Vec::new()
    };

    handle.shutdown();
    if let Err(e) = task.await {
        tracing::warn!(error = %e, "Controller task did not exit cleanly");
    }

    Ok(RunOutcome {
        job_id: job.id().clone(),
        state,
        saved,
    })
}

async fn watch<W: Write>(
    handle: &ControllerHandle,
    events: &mut tokio::sync::broadcast::Receiver<ControllerEvent>,
    renderer: &mut Renderer<W>,
    interrupt: impl Future<Output = ()>,
) -> anyhow::Result<ControllerState> {
    tokio::pin!(interrupt);
    let mut stop_sent = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    renderer.render(&event)?;
                    if let ControllerEvent::StateChanged { to, .. } = event {
                        if to.is_terminal() {
                            return Ok(to);
                        }
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Renderer fell behind, some events were skipped");
                    let state = handle.state().await?;
                    if state.is_terminal() {
                        return Ok(state);
                    }
                }
                Err(RecvError::Closed) => bail!("Controller stopped unexpectedly"),
            },
            _ = &mut interrupt, if !stop_sent => {
                stop_sent = true;
                if let Err(e) = handle.stop().await {
                    tracing::warn!(error = %e, "Stop ignored");
                }
            }
        }
    }
}

async fn download_outputs(
    handle: &ControllerHandle,
    plan: &DownloadPlan,
) -> anyhow::Result<Vec<PathBuf>> {
    let Some(output) = plan.output else {
        return Ok(Vec::new());
    };
    let view = handle.view().await?;
    if output == OutputChoice::Summary && !view.summary_available {
        tracing::warn!("No post-processed document for this job, nothing downloaded");
        return Ok(Vec::new());
    }
    let job_id = view.job_id.context("Completed job has no id")?;

    let kind = output.artifact(plan.merge);
    let bytes = handle.fetch_artifact(kind).await?;
    let name = kind.file_name(&job_id, view.output_type.as_deref());
    let path = artifacts::save(&plan.out_dir, &name, &bytes).await?;
    Ok(vec![path])
}

/// Resolves on the first Ctrl-C; never if the handler cannot be set up.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Read every input file into memory.
pub async fn read_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<InputFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Not a file: {}", path.display()))?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        files.push(InputFile::new(name, data));
    }
    Ok(files)
}

/// Build the request for `vox run`, filling in catalog defaults.
pub fn build_request(
    args: &RunArgs,
    credential: Option<String>,
    files: Vec<InputFile>,
) -> anyhow::Result<JobRequest> {
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| catalog::default_model(args.mode).to_string());
    if !catalog::is_known_model(args.mode, &model) {
        tracing::warn!(model = %model, mode = %args.mode, "Unknown model, sending it anyway");
    }
    if !catalog::is_known_language(&args.lang) {
        tracing::warn!(lang = %args.lang, "Unknown language, sending it anyway");
    }

    let mut builder = JobRequest::builder(args.mode, model, args.lang.clone()).files(files);
    if let Some(credential) = credential {
        builder = builder.credential(credential);
    }
    if let Some(kind) = args.output_type {
        builder = builder.output_kind(kind);
    }
    Ok(builder.build()?)
}

// ---------------------------------------------------------------------------
// status / download / health / models
// ---------------------------------------------------------------------------

/// `vox status`: print one snapshot.
pub async fn status(api: &TranscribeApi, args: StatusArgs) -> anyhow::Result<()> {
    let job_id = JobId::new(args.job_id);
    let snapshot = api
        .status(&job_id)
        .await
        .with_context(|| format!("Cannot get the status of job {job_id}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    let view = reconcile(&JobView::for_job(job_id), &snapshot)?.view;
    Renderer::new(std::io::stdout()).render_view(&view)?;
    Ok(())
}

/// `vox download`: save one output of a finished job.
pub async fn download(api: &TranscribeApi, args: DownloadArgs) -> anyhow::Result<()> {
    let job_id = JobId::new(args.job_id);
    let snapshot = api
        .status(&job_id)
        .await
        .with_context(|| format!("Cannot get the status of job {job_id}"))?;

    if snapshot.status != JobStatus::Done {
        bail!("Job {job_id} is {}, outputs are not ready", snapshot.status);
    }
    if args.kind == OutputChoice::Summary && !snapshot.use_api {
        bail!("Job {job_id} ran locally and has no post-processed document");
    }

    let kind = args.kind.artifact(!args.no_merge);
    let bytes = JobTransport::artifact(api, &job_id, kind).await?;
    let name = kind.file_name(&job_id, snapshot.output_type.as_deref());
    let path = artifacts::save(&args.out, &name, &bytes).await?;
    println!("Saved {}", path.display());
    Ok(())
}

/// `vox health`: check the server answers.
pub async fn health(api: &TranscribeApi) -> anyhow::Result<()> {
    let health = api
        .health()
        .await
        .with_context(|| format!("Server at {} is unreachable", api.base_url()))?;
    if !health.ok {
        bail!("Server at {} reports it is not healthy", api.base_url());
    }
    match health.base_dir {
        Some(dir) => println!("ok ({dir})"),
        None => println!("ok"),
    }
    Ok(())
}

/// `vox models`.
pub fn models() {
    print!("{}", models_listing());
}

/// Text listing of models, languages and output kinds, defaults marked.
pub fn models_listing() -> String {
    let mut out = String::new();
    for (title, mode) in [("Local models", JobMode::Local), ("Remote models", JobMode::Remote)] {
        push_section(
            &mut out,
            title,
            catalog::models_for(mode).iter().copied(),
            catalog::default_model(mode),
        );
    }
    push_section(
        &mut out,
        "Languages",
        catalog::LANGUAGES.iter().map(|(label, _)| *label),
        catalog::DEFAULT_LANGUAGE,
    );
    push_section(
        &mut out,
        "Output types (remote mode)",
        OUTPUT_KINDS.iter().map(|k| k.as_str()),
        OutputKind::default().as_str(),
    );
    out
}

fn push_section<'a>(
    out: &mut String,
    title: &str,
    items: impl Iterator<Item = &'a str>,
    default: &str,
) {
    out.push_str(title);
    out.push_str(":\n");
    for item in items {
        let marker = if item == default { " (default)" } else { "" };
        out.push_str(&format!("  {item}{marker}\n"));
    }
}
