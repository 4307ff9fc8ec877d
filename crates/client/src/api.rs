//! REST API client for the transcription server.
//!
//! Wraps the job endpoints (submission, status, archive and text
//! downloads, health) using [`reqwest`]. Paths are relative to the
//! configured base URL, e.g. `http://host:8000/api`.

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use vox_core::artifact::TextKind;
use vox_core::request::JobRequest;
use vox_core::snapshot::{parse_snapshot, JobSnapshot};
use vox_core::types::JobId;

use crate::config::ClientConfig;

/// HTTP client for a single transcription server.
#[derive(Debug, Clone)]
pub struct TranscribeApi {
    client: reqwest::Client,
    base_url: String,
}

/// Response returned by `POST /transcribe` once the job is queued.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the job.
    pub job_id: JobId,
}

/// Response returned by `GET /health`.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Directory the server works from, when reported.
    #[serde(default)]
    pub base_dir: Option<String>,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Server error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, shown to the user as is.
        body: String,
    },

    /// A 2xx response whose body is not the expected JSON.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the server answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl TranscribeApi {
    /// Create a new API client for a server.
    ///
    /// * `base_url` - Base HTTP URL including the API prefix, e.g.
    ///   `http://host:8000/api`. A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Build a client with the timeout from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.server_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a transcription job.
    ///
    /// Sends a multipart `POST /transcribe` with the form fields the
    /// server expects and one `files` part per input file. Returns the
    /// server-assigned job id.
    pub async fn submit(&self, request: &JobRequest) -> Result<SubmitResponse, ApiError> {
        let form = build_form(request);

        tracing::debug!(
            mode = %request.mode(),
            model = %request.model(),
            files = request.files().len(),
            "Submitting transcription job",
        );

        let response = self
            .client
            .post(self.url("transcribe"))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the full status snapshot of a job via `GET /status/{job_id}`.
    pub async fn status(&self, job_id: &JobId) -> Result<JobSnapshot, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("status/{job_id}")))
            .send()
            .await?;

        let body = Self::ensure_success(response).await?.bytes().await?;
        Ok(parse_snapshot(&body)?)
    }

    /// Download the zip archive of all outputs via `GET /download/{job_id}`.
    pub async fn download_archive(&self, job_id: &JobId) -> Result<Bytes, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("download/{job_id}")))
            .send()
            .await?;

        Ok(Self::ensure_success(response).await?.bytes().await?)
    }

    /// Download a text artifact via `GET /download-txt/{job_id}`.
    ///
    /// With `merge`, every matching file is concatenated under a
    /// `===== name =====` header; otherwise the server returns the single
    /// file when there is only one.
    pub async fn download_text(
        &self,
        job_id: &JobId,
        kind: TextKind,
        merge: bool,
    ) -> Result<Bytes, ApiError> {
        let merge_flag = if merge { "1" } else { "0" };
        let response = self
            .client
            .get(self.url(&format!("download-txt/{job_id}")))
            .query(&[("merge", merge_flag), ("kind", kind.as_str())])
            .send()
            .await?;

        Ok(Self::ensure_success(response).await?.bytes().await?)
    }

    /// Check that the server is up via `GET /health`.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        let response = self.client.get(self.url("health")).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let body = Self::ensure_success(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Encode a request as the multipart form of `POST /transcribe`.
fn build_form(request: &JobRequest) -> Form {
    let use_api = if request.mode().is_remote() { "1" } else { "0" };

    let mut form = Form::new()
        .text("use_api", use_api)
        .text("api_key", request.credential().unwrap_or_default().to_string())
        .text("model_label", request.model().to_string())
        .text("lang_label", request.language().to_string());

    if let Some(kind) = request.output_kind() {
        form = form.text("output_type", kind.as_str());
    }

    for file in request.files() {
        let part = Part::bytes(file.data.to_vec()).file_name(file.name.clone());
        form = form.part("files", part);
    }

    form
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = TranscribeApi::new("http://localhost:8000/api/");
        assert_eq!(api.base_url(), "http://localhost:8000/api");
        assert_eq!(api.url("status/1"), "http://localhost:8000/api/status/1");
    }

    #[test]
    fn not_found_detection() {
        let err = ApiError::Status {
            status: 404,
            body: "Job introuvable".into(),
        };
        assert!(err.is_not_found());

        let err = ApiError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn status_error_shows_body() {
        let err = ApiError::Status {
            status: 400,
            body: "Langue inconnue".into(),
        };
        assert_eq!(err.to_string(), "Server error (400): Langue inconnue");
    }
}
