//! Pure reconciliation of status snapshots into a renderable view.
//!
//! [`reconcile`] folds one [`JobSnapshot`] into the previous
//! [`JobView`] and reports what changed. The log is append-only on the
//! server, so a [`LogCursor`] remembers how many lines were already
//! rendered and only the tail past it is ever added.

use serde::Serialize;
use vox_core::snapshot::{FileState, FileStatus, JobSnapshot, JobStatus};
use vox_core::types::JobId;

/// Number of log lines already rendered for the current job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogCursor(usize);

impl LogCursor {
    pub fn position(self) -> usize {
        self.0
    }

    /// Lines of `logs` past the cursor.
    ///
    /// A sequence shorter than the cursor means the server truncated its
    /// log, which never happens for a well-behaved server.
    pub fn delta(self, logs: &[String]) -> Result<&[String], ReconcileError> {
        logs.get(self.0..).ok_or(ReconcileError::LogTruncated {
            rendered: self.0,
            received: logs.len(),
        })
    }

    /// Advance past `consumed` lines.
    fn advance(self, consumed: usize) -> Self {
        Self(self.0 + consumed)
    }
}

/// Snapshots that cannot be folded into the view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("log shrank from {rendered} to {received} lines")]
    LogTruncated { rendered: usize, received: usize },
}

/// One rendered file row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRow {
    pub name: String,
    pub status: FileState,
    /// 0–100; always 100 once the file is done.
    pub percent: u8,
    /// File name (not path) of the produced output.
    pub output: Option<String>,
    pub error: Option<String>,
}

impl FileRow {
    pub fn from_status(file: &FileStatus) -> Self {
        let percent = if file.status == FileState::Done {
            100
        } else {
            to_percent(file.progress)
        };
        Self {
            name: file.name.clone(),
            status: file.status,
            percent,
            output: file.out_path.as_deref().map(file_name).map(str::to_string),
            error: file.error.clone(),
        }
    }
}

/// Everything the UI shows about the current job.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobView {
    pub job_id: Option<JobId>,
    /// Last status reported by the server.
    pub status: Option<JobStatus>,
    /// Overall progress fraction; 1.0 once the job is over.
    pub progress: f64,
    pub files: Vec<FileRow>,
    /// Every log line rendered so far, in server order.
    pub log: Vec<String>,
    pub cursor: LogCursor,
    /// Outputs can be downloaded.
    pub downloads_ready: bool,
    /// A post-processed document exists (remote mode).
    pub summary_available: bool,
    pub output_type: Option<String>,
}

impl JobView {
    /// Empty view for a freshly started job.
    pub fn for_job(job_id: JobId) -> Self {
        Self {
            job_id: Some(job_id),
            ..Default::default()
        }
    }

    /// The log as one newline-joined block.
    pub fn rendered_log(&self) -> String {
        self.log.join("\n")
    }

    pub fn percent(&self) -> u8 {
        to_percent(self.progress)
    }
}

/// Result of folding one snapshot into a view.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub view: JobView,
    /// Log lines that were not rendered before.
    pub new_lines: Vec<String>,
    /// Whether the file rows differ from the previous view.
    pub files_changed: bool,
}

/// Fold `snapshot` into `previous`.
///
/// 1. Appends `logs[cursor..]` and moves the cursor to the end.
/// 2. Replaces the file rows wholesale, except that a row already shown
///    as `done`/`error` is never replaced by a non-terminal one.
/// 3. Copies progress and status, pinning progress to 1.0 on a
///    terminal status.
pub fn reconcile(previous: &JobView, snapshot: &JobSnapshot) -> Result<Reconciled, ReconcileError> {
    let delta = previous.cursor.delta(&snapshot.logs)?;
    let new_lines = delta.to_vec();

    let mut log = previous.log.clone();
    log.extend(new_lines.iter().cloned());
    let cursor = previous.cursor.advance(new_lines.len());

    let files: Vec<FileRow> = snapshot
        .files
        .iter()
        .enumerate()
        .map(|(idx, file)| {
            let row = FileRow::from_status(file);
            match previous.files.get(idx) {
                Some(prev) if prev.name == row.name && regresses(prev, &row) => {
                    tracing::warn!(
                        file = %row.name,
                        from = %prev.status,
                        to = %row.status,
                        "Ignoring file status regression",
                    );
                    prev.clone()
                }
                _ => row,
            }
        })
        .collect();
    let files_changed = files != previous.files;

    let progress = if snapshot.status.is_terminal() {
        1.0
    } else {
        snapshot.progress
    };

    let view = JobView {
        job_id: previous.job_id.clone(),
        status: Some(snapshot.status),
        progress,
        files,
        log,
        cursor,
        downloads_ready: snapshot.status == JobStatus::Done,
        summary_available: snapshot.use_api,
        output_type: snapshot
            .output_type
            .clone()
            .or_else(|| previous.output_type.clone()),
    };

    Ok(Reconciled {
        view,
        new_lines,
        files_changed,
    })
}

fn regresses(prev: &FileRow, next: &FileRow) -> bool {
    prev.status.is_terminal() && !next.status.is_terminal()
}

fn to_percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Last path component, for `/` or `\` separated paths.
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
