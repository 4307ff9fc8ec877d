//! Terminal rendering of controller events and job views.
//!
//! Reconciliation happens in the controller; this module only turns its
//! events into lines of text.

use std::io::{self, Write};

use vox_controller::controller::ControllerState;
use vox_controller::events::ControllerEvent;
use vox_controller::view::{FileRow, JobView};

/// Writes controller events as plain text lines.
pub struct Renderer<W: Write> {
    out: W,
    /// Last progress percentage printed, to avoid repeating it every poll.
    last_percent: Option<u8>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_percent: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, event: &ControllerEvent) -> io::Result<()> {
        match event {
            ControllerEvent::JobStarted { job_id } => {
                self.last_percent = None;
                writeln!(self.out, "Job {job_id} started")?;
            }
            ControllerEvent::LogLines { lines } => {
                for line in lines {
                    writeln!(self.out, "  | {line}")?;
                }
            }
            ControllerEvent::FilesUpdated { files } => {
                for row in files {
                    writeln!(self.out, "{}", file_line(row))?;
                }
            }
            ControllerEvent::Progress { fraction, status } => {
                let percent = (fraction * 100.0).round().clamp(0.0, 100.0) as u8;
                if self.last_percent != Some(percent) {
                    self.last_percent = Some(percent);
                    writeln!(self.out, "[{percent:>3}%] {status}")?;
                }
            }
            ControllerEvent::StateChanged { to, .. } => match to {
                ControllerState::Completed => writeln!(self.out, "Job completed")?,
                ControllerState::Stopped => writeln!(self.out, "Stopped following the job")?,
                _ => {}
            },
            ControllerEvent::StopRequested => {
                writeln!(
                    self.out,
                    "Stop requested; the job keeps running on the server"
                )?;
            }
            ControllerEvent::Error { message } => {
                writeln!(self.out, "error: {message}")?;
            }
        }
        self.out.flush()
    }

    /// Print a full view, as `vox status` does.
    pub fn render_view(&mut self, view: &JobView) -> io::Result<()> {
        if let Some(job_id) = &view.job_id {
            writeln!(self.out, "Job {job_id}")?;
        }
        let status = view.status.map(|s| s.as_str()).unwrap_or("unknown");
        writeln!(self.out, "[{:>3}%] {status}", view.percent())?;
        for row in &view.files {
            writeln!(self.out, "{}", file_line(row))?;
        }
        for line in &view.log {
            writeln!(self.out, "  | {line}")?;
        }
        if view.downloads_ready {
            writeln!(self.out, "Outputs ready for download")?;
        }
        self.out.flush()
    }
}

fn file_line(row: &FileRow) -> String {
    // Display impls ignore width, so pad the plain strings.
    let mut line = format!(
        "  {:<32} {:<10} {:>3}%",
        row.name,
        row.status.as_str(),
        row.percent
    );
    if let Some(output) = &row.output {
        line.push_str(" -> ");
        line.push_str(output);
    }
    if let Some(error) = &row.error {
        line.push_str(" (");
        line.push_str(error);
        line.push(')');
    }
    line
}
