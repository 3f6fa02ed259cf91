//! Error types for the Kaiten API layer.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Underlying HTTP client error (connect, decode, ...).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// IO error while writing downloaded data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error while persisting fetched entities.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// HTTP response returned a non-success status with body.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// The API answered successfully but the payload cannot be used.
    #[error("unexpected API data: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
