//! `vox` -- command-line client for the transcription server.
//!
//! Submits audio files, follows the job until it ends and downloads the
//! outputs.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default                     | Description                          |
//! |----------------------------|----------|-----------------------------|--------------------------------------|
//! | `VOX_SERVER_URL`           | no       | `http://127.0.0.1:8000/api` | Server base URL with the API prefix  |
//! | `VOX_REQUEST_TIMEOUT_SECS` | no       | `30`                        | Per-request HTTP timeout             |
//! | `VOX_POLL_INTERVAL_MS`     | no       | `1000`                      | Status poll period                   |
//! | `VOX_STOP_ACK_MS`          | no       | `500`                       | Delay before a stop is acknowledged  |
//! | `OPENAI_API_KEY`           | no       | --                          | Credential for remote mode           |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vox_cli::cli::{Cli, Command};
use vox_cli::commands;
use vox_cli::config::CliConfig;
use vox_client::api::TranscribeApi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = CliConfig::from_env().with_server(cli.server);
    tracing::debug!(server_url = %config.client.server_url, "Configuration loaded");

    let api = TranscribeApi::from_config(&config.client)?;

    match cli.command {
        Command::Run(args) => commands::run(api, config.controller, args).await,
        Command::Status(args) => commands::status(&api, args).await,
        Command::Download(args) => commands::download(&api, args).await,
        Command::Health => commands::health(&api).await,
        Command::Models => {
            commands::models();
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays clean for command output.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vox_cli=info,vox_controller=info".into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
