use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{file}: missing required column(s): {columns}")]
    MissingColumns { file: String, columns: String },

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("No valid rows remain after cleaning")]
    NoValidRows,

    #[error("{0} row(s) failed resolution; aborting (strict mode)")]
    InvalidRows(usize),

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BatchError>;
