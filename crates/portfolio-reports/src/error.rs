use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown benchmark index: {0}")]
    UnknownBenchmark(String),

    #[error("Invalid horizon list: {0}")]
    InvalidHorizons(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
