//! CLI configuration: environment first, flags on top.

use vox_client::config::ClientConfig;
use vox_controller::config::ControllerConfig;

/// Environment variable read when `--api-key` is not given.
pub const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

/// Everything the commands need to reach the server and drive a job.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub controller: ControllerConfig,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                     |
    /// |----------------------------|-----------------------------|
    /// | `VOX_SERVER_URL`           | `http://127.0.0.1:8000/api` |
    /// | `VOX_REQUEST_TIMEOUT_SECS` | `30`                        |
    /// | `VOX_POLL_INTERVAL_MS`     | `1000`                      |
    /// | `VOX_STOP_ACK_MS`          | `500`                       |
    pub fn from_env() -> Self {
        Self {
            client: ClientConfig::from_env(),
            controller: ControllerConfig::from_env(),
        }
    }

    /// Apply a `--server` override.
    pub fn with_server(mut self, server: Option<String>) -> Self {
        if let Some(url) = server.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            self.client.server_url = url;
        }
        self
    }
}

/// The credential to submit with: the flag if given, else `OPENAI_API_KEY`.
pub fn resolve_credential(flag: Option<String>) -> Option<String> {
    pick_credential(flag, std::env::var(CREDENTIAL_ENV).ok())
}

fn pick_credential(flag: Option<String>, env: Option<String>) -> Option<String> {
    let usable = |value: String| {
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    };
    flag.and_then(usable).or_else(|| env.and_then(usable))
}
