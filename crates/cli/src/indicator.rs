//! Decorative "working" waveform drawn on stderr while a job runs.
//!
//! Purely cosmetic: it knows nothing about the job and only has to be
//! started and stopped.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Number of bars in the waveform.
pub const BAR_COUNT: usize = 60;

/// Resting bar height (0.0-1.0).
pub const BASE_HEIGHT: f64 = 0.35;

/// Peak deviation from [`BASE_HEIGHT`].
pub const AMPLITUDE: f64 = 0.15;

/// Phase advance per animation step.
pub const SPEED: f64 = 0.02;

/// Phase offset between neighbouring bars.
const BAR_PHASE: f64 = 0.3;

/// Time between two redraws.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Animation steps per redraw (the animation was tuned for ~60 steps/s).
const STEPS_PER_FRAME: f64 = 2.0;

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Bar heights at animation time `time`.
pub fn samples(time: f64) -> Vec<f64> {
    (0..BAR_COUNT)
        .map(|i| BASE_HEIGHT + (time + i as f64 * BAR_PHASE).sin() * AMPLITUDE)
        .collect()
}

/// One line of block characters for `heights`.
pub fn frame(heights: &[f64]) -> String {
    let low = BASE_HEIGHT - AMPLITUDE;
    let span = 2.0 * AMPLITUDE;
    heights
        .iter()
        .map(|h| {
            let level = ((h - low) / span * (LEVELS.len() - 1) as f64).round();
            LEVELS[level.clamp(0.0, (LEVELS.len() - 1) as f64) as usize]
        })
        .collect()
}

/// Animated waveform with `start()`/`stop()`.
pub struct ActivityIndicator {
    draw: bool,
    running: Option<(CancellationToken, JoinHandle<()>)>,
}

impl Default for ActivityIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityIndicator {
    /// Draws only when stderr is a terminal.
    pub fn new() -> Self {
        Self::with_drawing(io::stderr().is_terminal())
    }

    pub fn with_drawing(draw: bool) -> Self {
        Self {
            draw,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start animating. No-op if already running.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let draw = self.draw;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FRAME_INTERVAL);
            let mut time = 0.0_f64;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        time += SPEED * STEPS_PER_FRAME;
                        if draw {
                            let mut err = io::stderr().lock();
                            let _ = write!(err, "\r{}", frame(&samples(time)));
                            let _ = err.flush();
                        }
                    }
                }
            }
        });

        self.running = Some((cancel, task));
    }

    /// Stop animating and clear the line. No-op if not running.
    pub async fn stop(&mut self) {
        let Some((cancel, task)) = self.running.take() else {
            return;
        };
        cancel.cancel();
        if let Err(e) = task.await {
            tracing::debug!(error = %e, "Activity indicator task ended abnormally");
        }
        if self.draw {
            let mut err = io::stderr().lock();
            let _ = write!(err, "\r{}\r", " ".repeat(BAR_COUNT));
            let _ = err.flush();
        }
    }
}
