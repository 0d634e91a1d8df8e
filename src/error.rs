use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a top-level JSON array of appointments, found {0}")]
    InputShape(String),

    #[error("Invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Missing required field '{field}' on appointment {appointment}")]
    MissingField { field: String, appointment: String },

    #[error("Malformed record for appointment {appointment}: {message}")]
    MalformedRecord { appointment: String, message: String },

    #[error("Duplicate field path: {0}")]
    DuplicatePath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors that belong to a single appointment and may be skipped under
    /// the `skip` record policy. Everything else always aborts the run.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidDate { .. }
                | PipelineError::MissingField { .. }
                | PipelineError::MalformedRecord { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
