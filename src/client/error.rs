//! Error types for the chat client.

use thiserror::Error;

/// A request to the chat server failed.
///
/// The controller does not distinguish between these when talking to the
/// user; the variants exist for logging.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connection refused, reset, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid server URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-2xx status.
    #[error("Server responded with {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },
}

/// Reading or writing the local key-value store failed.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying file I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
