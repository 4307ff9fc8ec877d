#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown {field}: '{value}'")]
    UnknownValue { field: &'static str, value: String },
}
