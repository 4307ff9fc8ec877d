//! HTTP client for the transcription server.
//!
//! Wraps job submission, status polling and artifact downloads behind
//! [`api::TranscribeApi`], with connection settings loaded by
//! [`config::ClientConfig`].

pub mod api;
pub mod config;
