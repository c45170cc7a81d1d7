use thiserror::Error;

#[derive(Error, Debug)]
pub enum SochiError {
    /// Empty candidate set, malformed fingerprint or bad solution data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The data-access collaborator could not produce the requested data.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Unique-constraint violation inside the catalog.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing catalog record or staged artifact.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
