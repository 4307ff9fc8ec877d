//! Domain types shared by the Vox transcription client.
//!
//! Holds the job request/handle/snapshot model, caller-side validation,
//! the model and language catalog mirrored from the transcription
//! server, and artifact naming rules.

pub mod artifact;
pub mod catalog;
pub mod error;
pub mod request;
pub mod snapshot;
pub mod types;
