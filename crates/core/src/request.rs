//! Job submission request and caller-side validation.
//!
//! A [`JobRequest`] can only be obtained through
//! [`JobRequestBuilder::build`], which rejects empty file lists and a
//! missing credential in remote mode before anything touches the
//! network.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Where the server runs the transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// On the server's own CPU.
    Local,
    /// Through a hosted API; needs a credential.
    Remote,
}

impl JobMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }

    pub fn is_remote(self) -> bool {
        matches!(self, Self::Remote)
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            // The web form calls remote mode "api".
            "remote" | "api" => Ok(Self::Remote),
            other => Err(CoreError::UnknownValue {
                field: "mode",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Output kind
// ---------------------------------------------------------------------------

/// Post-processing the server applies to a remote transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    #[default]
    Resume,
    CompteRendu,
    CahierDesCharges,
    NotesDeCadrage,
}

/// All output kinds, in the order the server lists them.
pub const OUTPUT_KINDS: &[OutputKind] = &[
    OutputKind::Resume,
    OutputKind::CompteRendu,
    OutputKind::CahierDesCharges,
    OutputKind::NotesDeCadrage,
];

impl OutputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::CompteRendu => "compte_rendu",
            Self::CahierDesCharges => "cahier_des_charges",
            Self::NotesDeCadrage => "notes_de_cadrage",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OUTPUT_KINDS
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::UnknownValue {
                field: "output kind",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One audio file to upload.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub data: Bytes,
}

impl InputFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Immutable description of a job to submit.
#[derive(Debug, Clone)]
pub struct JobRequest {
    mode: JobMode,
    model: String,
    language: String,
    credential: Option<String>,
    output_kind: Option<OutputKind>,
    files: Vec<InputFile>,
}

impl JobRequest {
    /// Start building a request for the given mode, model label and
    /// language label.
    pub fn builder(
        mode: JobMode,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> JobRequestBuilder {
        JobRequestBuilder {
            mode,
            model: model.into(),
            language: language.into(),
            credential: None,
            output_kind: None,
            files: Vec::new(),
        }
    }

    pub fn mode(&self) -> JobMode {
        self.mode
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Trimmed credential; always `Some` in remote mode.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Requested post-processing; `None` in local mode.
    pub fn output_kind(&self) -> Option<OutputKind> {
        self.output_kind
    }

    pub fn files(&self) -> &[InputFile] {
        &self.files
    }
}

/// Accumulates the fields of a [`JobRequest`].
#[derive(Debug, Clone)]
pub struct JobRequestBuilder {
    mode: JobMode,
    model: String,
    language: String,
    credential: Option<String>,
    output_kind: Option<OutputKind>,
    files: Vec<InputFile>,
}

impl JobRequestBuilder {
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = Some(kind);
        self
    }

    pub fn file(mut self, file: InputFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn files(mut self, files: impl IntoIterator<Item = InputFile>) -> Self {
        self.files.extend(files);
        self
    }

    /// Validate and freeze the request.
    ///
    /// Remote mode defaults the output kind to [`OutputKind::Resume`];
    /// local mode drops it since the server ignores it there.
    pub fn build(self) -> Result<JobRequest, CoreError> {
        validate_label("model", &self.model)?;
        validate_label("language", &self.language)?;
        validate_files(&self.files)?;

        let credential = self
            .credential
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let output_kind = match self.mode {
            JobMode::Remote => {
                if credential.is_none() {
                    return Err(CoreError::Validation(
                        "An API key is required in remote mode".to_string(),
                    ));
                }
                Some(self.output_kind.unwrap_or_default())
            }
            JobMode::Local => None,
        };

        Ok(JobRequest {
            mode: self.mode,
            model: self.model,
            language: self.language,
            credential,
            output_kind,
            files: self.files,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

fn validate_label(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Validate that at least one file is present and every file is named.
pub fn validate_files(files: &[InputFile]) -> Result<(), CoreError> {
    if files.is_empty() {
        return Err(CoreError::Validation(
            "Add at least one audio file".to_string(),
        ));
    }
    if let Some(pos) = files.iter().position(|f| f.name.trim().is_empty()) {
        return Err(CoreError::Validation(format!(
            "File #{} has no name",
            pos + 1
        )));
    }
    Ok(())
}
