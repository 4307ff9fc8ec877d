use std::time::Duration;

/// Default period between two status polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default delay between a stop request and the `Stopped` state, in
/// milliseconds.
pub const DEFAULT_STOP_ACK_MS: u64 = 500;

/// Timing of the poll driver.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Fixed period between two status queries (default: 1 s).
    pub poll_interval: Duration,
    /// How long a stop stays in `Stopping` before `Stopped` (default: 500 ms).
    pub stop_ack_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            stop_ack_delay: Duration::from_millis(DEFAULT_STOP_ACK_MS),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `VOX_POLL_INTERVAL_MS` | `1000`  |
    /// | `VOX_STOP_ACK_MS`      | `500`   |
    ///
    /// A zero poll interval is rejected in favour of the default.
    pub fn from_env() -> Self {
        let poll_ms = env_millis("VOX_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);
        let poll_ms = if poll_ms == 0 {
            tracing::warn!("VOX_POLL_INTERVAL_MS must be positive, using the default");
            DEFAULT_POLL_INTERVAL_MS
        } else {
            poll_ms
        };

        Self {
            poll_interval: Duration::from_millis(poll_ms),
            stop_ack_delay: Duration::from_millis(env_millis(
                "VOX_STOP_ACK_MS",
                DEFAULT_STOP_ACK_MS,
            )),
        }
    }
}

fn env_millis(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Not a valid number of milliseconds");
            default
        }),
        Err(_) => default,
    }
}
