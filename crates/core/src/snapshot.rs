//! Job status snapshots returned by `GET /status/{job_id}`.
//!
//! The server reports the whole job every time: overall status and
//! progress, one [`FileStatus`] per uploaded file, and the cumulative
//! log. The log only ever grows between two snapshots of the same job.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Overall job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    #[serde(alias = "running")]
    Processing,
    Done,
    Error,
}

impl JobStatus {
    /// `done` and `error` end the job; nothing changes afterwards.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    #[serde(alias = "queued")]
    Pending,
    #[serde(alias = "running")]
    Processing,
    Done,
    Error,
}

impl FileState {
    /// Once `done` or `error`, a file never goes back.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file progress as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStatus {
    pub name: String,
    pub status: FileState,
    #[serde(default, deserialize_with = "fraction")]
    pub progress: f64,
    #[serde(default)]
    pub out_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Full point-in-time state of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    #[serde(default, deserialize_with = "fraction")]
    pub progress: f64,
    #[serde(default)]
    pub files: Vec<FileStatus>,
    /// Cumulative, append-only log.
    #[serde(default)]
    pub logs: Vec<String>,
    /// Whether the job runs through the hosted API.
    #[serde(default)]
    pub use_api: bool,
    /// Post-processing kind requested at submission, if any.
    #[serde(default)]
    pub output_type: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Parse a status body, e.g. from `GET /status/{job_id}`.
pub fn parse_snapshot(body: &[u8]) -> Result<JobSnapshot, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Read a progress fraction, clamping it into `0.0..=1.0`.
///
/// `null` and NaN read as `0.0`.
fn fraction<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if raw.is_nan() {
        return Ok(0.0);
    }
    Ok(raw.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_payload_with_aliases() {
        let body = br#"{
            "status": "running",
            "created_at": "2025-01-05T10:00:00",
            "use_api": false,
            "model": "base",
            "lang": "fr",
            "output_type": null,
            "progress": 0.25,
            "logs": ["Job x cree avec 2 fichier(s)."],
            "files": [
                {"name": "a.mp3", "path": "/up/a.mp3", "status": "running", "progress": 0.5, "out_path": null, "error": null},
                {"name": "b.mp3", "path": "/up/b.mp3", "status": "queued", "progress": 0.0, "out_path": null, "error": null}
            ]
        }"#;

        let snap = parse_snapshot(body).unwrap();
        assert_eq!(snap.status, JobStatus::Processing);
        assert_eq!(snap.files[0].status, FileState::Processing);
        assert_eq!(snap.files[1].status, FileState::Pending);
        assert_eq!(snap.model.as_deref(), Some("base"));
        assert_eq!(snap.logs.len(), 1);
    }

    #[test]
    fn minimal_payload_uses_defaults() {
        let snap = parse_snapshot(br#"{"status":"pending"}"#).unwrap();
        assert_eq!(snap.progress, 0.0);
        assert!(snap.files.is_empty());
        assert!(snap.logs.is_empty());
        assert!(!snap.use_api);
    }

    #[test]
    fn progress_is_clamped() {
        let snap = parse_snapshot(
            br#"{"status":"done","progress":1.7,"files":[{"name":"a","status":"done","progress":-0.2}]}"#,
        )
        .unwrap();
        assert_eq!(snap.progress, 1.0);
        assert_eq!(snap.files[0].progress, 0.0);
    }

    #[test]
    fn null_progress_reads_as_zero() {
        let snap = parse_snapshot(br#"{"status":"pending","progress":null}"#).unwrap();
        assert_eq!(snap.progress, 0.0);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(parse_snapshot(br#"{"status":"paused"}"#).is_err());
    }

    #[test]
    fn missing_status_is_rejected() {
        assert!(parse_snapshot(br#"{"progress":0.5}"#).is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(FileState::Error.is_terminal());
        assert!(!FileState::Pending.is_terminal());
    }
}
