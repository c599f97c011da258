use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported release timing: {0:?} (expected AMC or BMO)")]
    UnsupportedReleaseFlag(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Session time does not exist in exchange zone on {0}")]
    SessionTime(NaiveDate),
}

pub type Result<T> = std::result::Result<T, AppError>;
