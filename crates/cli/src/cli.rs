//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vox_core::artifact::{ArtifactKind, TextKind};
use vox_core::request::{JobMode, OutputKind};

#[derive(Debug, Parser)]
#[command(name = "vox", version)]
#[command(about = "Submit audio files for transcription and follow the job", long_about = None)]
pub struct Cli {
    /// Server base URL, including the API prefix (overrides VOX_SERVER_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a transcription job and follow it until it ends
    Run(RunArgs),
    /// Print the current state of a job
    Status(StatusArgs),
    /// Download the outputs of a finished job
    Download(DownloadArgs),
    /// Check that the server is reachable
    Health,
    /// List known models, languages and output types
    Models,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Where transcription runs: on the server (`local`) or through the hosted API (`remote`)
    #[arg(long, default_value = "local")]
    pub mode: JobMode,

    /// Model label (default depends on the mode)
    #[arg(long)]
    pub model: Option<String>,

    /// Language label
    #[arg(long, default_value = vox_core::catalog::DEFAULT_LANGUAGE)]
    pub lang: String,

    /// API key for remote mode (falls back to OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Post-processed document to produce in remote mode
    #[arg(long)]
    pub output_type: Option<OutputKind>,

    /// Directory downloads are written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// What to download once the job completes
    #[arg(long, value_enum, default_value = "archive")]
    pub download: DownloadChoice,

    /// Keep one text document per file instead of merging them
    #[arg(long, default_value_t = false)]
    pub no_merge: bool,

    /// Do not draw the activity indicator
    #[arg(long, default_value_t = false)]
    pub no_indicator: bool,

    /// Audio files to transcribe
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    pub job_id: String,

    /// Print the raw status document as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    pub job_id: String,

    /// Output to download
    #[arg(long, value_enum, default_value = "archive")]
    pub kind: OutputChoice,

    /// Keep one text document per file instead of merging them
    #[arg(long, default_value_t = false)]
    pub no_merge: bool,

    /// Directory the download is written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

/// A downloadable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputChoice {
    /// Zip archive of every transcription
    Archive,
    /// Transcription text
    Text,
    /// Post-processed document (remote mode only)
    Summary,
}

impl OutputChoice {
    pub fn artifact(self, merge: bool) -> ArtifactKind {
        match self {
            Self::Archive => ArtifactKind::Archive,
            Self::Text => ArtifactKind::Text {
                kind: TextKind::Transcription,
                merge,
            },
            Self::Summary => ArtifactKind::Text {
                kind: TextKind::Summary,
                merge,
            },
        }
    }
}

/// What `run` downloads after completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DownloadChoice {
    Archive,
    Text,
    Summary,
    /// Download nothing
    None,
}

impl DownloadChoice {
    pub fn output(self) -> Option<OutputChoice> {
        match self {
            Self::Archive => Some(OutputChoice::Archive),
            Self::Text => Some(OutputChoice::Text),
            Self::Summary => Some(OutputChoice::Summary),
            Self::None => None,
        }
    }
}
