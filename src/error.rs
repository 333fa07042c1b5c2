use thiserror::Error;

use crate::pipeline::processing::normalize::StructuralInputError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] calamine::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source {source_key} has no URL configured")]
    MissingUrl { source_key: String },

    #[error("Fetch for {source_key} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        source_key: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Invalid raw file {path}: {reason}")]
    InvalidRawFile { path: String, reason: String },

    #[error("Structural input error: {0}")]
    Structural(#[from] StructuralInputError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
