//! Model, language and output-kind catalog.
//!
//! Mirrors the labels the transcription server accepts. The server stays
//! authoritative: these lists drive CLI defaults and the `models`
//! listing, they are not used to reject requests.

use crate::request::JobMode;

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Labels of the models the server runs locally (CPU, int8).
pub const MODELS_LOCAL: &[&str] = &["Base", "Small", "Medium", "Large v3 (CPU lourd)"];

/// Identifiers of the hosted (remote API) transcription models.
pub const MODELS_REMOTE: &[&str] = &["gpt-4o-transcribe", "gpt-4o-mini-transcribe", "whisper-1"];

/// Model preselected for local mode.
pub const DEFAULT_MODEL_LOCAL: &str = "Large v3 (CPU lourd)";

// ---------------------------------------------------------------------------
// Languages
// ---------------------------------------------------------------------------

/// Language labels paired with their ISO 639-1 codes.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("Français", "fr"),
    ("Anglais", "en"),
    ("Espagnol", "es"),
    ("Allemand", "de"),
    ("Italien", "it"),
    ("Portugais", "pt"),
    ("Néerlandais", "nl"),
    ("Russe", "ru"),
    ("Arabe", "ar"),
    ("Chinois", "zh"),
    ("Japonais", "ja"),
];

/// Language preselected in every mode.
pub const DEFAULT_LANGUAGE: &str = "Français";

/// Models offered for a given mode.
pub fn models_for(mode: JobMode) -> &'static [&'static str] {
    match mode {
        JobMode::Local => MODELS_LOCAL,
        JobMode::Remote => MODELS_REMOTE,
    }
}

/// Default model for a mode: the heavy local model, or the first remote one.
pub fn default_model(mode: JobMode) -> &'static str {
    match mode {
        JobMode::Local => DEFAULT_MODEL_LOCAL,
        JobMode::Remote => MODELS_REMOTE[0],
    }
}

/// Whether `label` is one of the models known for `mode`.
pub fn is_known_model(mode: JobMode, label: &str) -> bool {
    models_for(mode).contains(&label)
}

/// Whether `label` is one of the known language labels.
pub fn is_known_language(label: &str) -> bool {
    LANGUAGES.iter().any(|(name, _)| *name == label)
}
