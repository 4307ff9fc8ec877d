//! Render/update events emitted by the controller.
//!
//! These are what a UI layer consumes: the controller never draws
//! anything itself. Delivered over a [`tokio::sync::broadcast`] channel.

use serde::Serialize;
use vox_core::snapshot::JobStatus;
use vox_core::types::JobId;

use crate::controller::ControllerState;
use crate::view::FileRow;

/// A change the UI should reflect.
#[derive(Debug, Clone, Serialize)]
pub enum ControllerEvent {
    /// The lifecycle state moved.
    StateChanged {
        from: ControllerState,
        to: ControllerState,
    },

    /// The server accepted a job.
    JobStarted { job_id: JobId },

    /// Log lines not rendered before, in order.
    LogLines { lines: Vec<String> },

    /// The file rows changed; this is the full new set.
    FilesUpdated { files: Vec<FileRow> },

    /// Overall progress after a poll.
    Progress {
        /// Completion fraction (0.0-1.0).
        fraction: f64,
        status: JobStatus,
    },

    /// Stop acknowledged; polling has already ceased.
    StopRequested,

    /// A user-visible error. Emitted once per failure.
    Error { message: String },
}
