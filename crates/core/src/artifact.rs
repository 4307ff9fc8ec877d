//! Downloadable job outputs and their local file names.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::JobId;

/// Which text documents to fetch from `GET /download-txt/{job_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// Raw transcriptions.
    Transcription,
    /// Post-processed documents (remote mode only).
    Summary,
}

impl TextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for TextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcription" => Ok(Self::Transcription),
            "summary" => Ok(Self::Summary),
            other => Err(CoreError::UnknownValue {
                field: "text kind",
                value: other.to_string(),
            }),
        }
    }
}

/// A completed output of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Zip archive of every output file.
    Archive,
    /// Text document; `merge` concatenates all files into one.
    Text { kind: TextKind, merge: bool },
}

impl ArtifactKind {
    /// Local file name for this artifact, matching what the server puts
    /// in `Content-Disposition`.
    ///
    /// Summaries are named after the job's output type when known.
    pub fn file_name(&self, job_id: &JobId, output_type: Option<&str>) -> String {
        match self {
            Self::Archive => format!("transcriptions_{job_id}.zip"),
            Self::Text {
                kind: TextKind::Summary,
                ..
            } => {
                let root = output_type.filter(|t| !t.is_empty()).unwrap_or("summary");
                format!("{root}_{job_id}.txt")
            }
            Self::Text {
                kind: TextKind::Transcription,
                ..
            } => format!("transcriptions_{job_id}.txt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name() {
        let id = JobId::new("42");
        assert_eq!(
            ArtifactKind::Archive.file_name(&id, None),
            "transcriptions_42.zip"
        );
    }

    #[test]
    fn summary_is_named_after_output_type() {
        let id = JobId::new("42");
        let kind = ArtifactKind::Text {
            kind: TextKind::Summary,
            merge: true,
        };
        assert_eq!(kind.file_name(&id, Some("compte_rendu")), "compte_rendu_42.txt");
        assert_eq!(kind.file_name(&id, None), "summary_42.txt");
    }

    #[test]
    fn transcription_ignores_output_type() {
        let id = JobId::new("42");
        let kind = ArtifactKind::Text {
            kind: TextKind::Transcription,
            merge: false,
        };
        assert_eq!(kind.file_name(&id, Some("resume")), "transcriptions_42.txt");
    }

    #[test]
    fn text_kind_round_trips_query_value() {
        assert_eq!("summary".parse::<TextKind>().unwrap(), TextKind::Summary);
        assert!("pdf".parse::<TextKind>().is_err());
    }
}
