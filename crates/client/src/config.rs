/// Default server base URL, including the API prefix.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/api";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the transcription server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including the API prefix (default: [`DEFAULT_SERVER_URL`]).
    pub server_url: String,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                     |
    /// |----------------------------|-----------------------------|
    /// | `VOX_SERVER_URL`           | `http://127.0.0.1:8000/api` |
    /// | `VOX_REQUEST_TIMEOUT_SECS` | `30`                        |
    ///
    /// Unparseable numbers fall back to the default with a warning.
    pub fn from_env() -> Self {
        let server_url = std::env::var("VOX_SERVER_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let request_timeout_secs = match std::env::var("VOX_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "VOX_REQUEST_TIMEOUT_SECS is not a valid u64");
                DEFAULT_REQUEST_TIMEOUT_SECS
            }),
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Self {
            server_url,
            request_timeout_secs,
        }
    }
}
