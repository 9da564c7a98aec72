//! Error types for comic-mcp.

use thiserror::Error;

/// Result type alias for comic-mcp.
pub type Result<T> = std::result::Result<T, ComicError>;

/// Comic server error types.
#[derive(Error, Debug)]
pub enum ComicError {
    /// Configuration error (missing credentials, bad config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/transport error talking to Komga.
    #[error("Network error: {0}")]
    Network(String),

    /// Komga answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid tool input.
    #[error("{0}")]
    Validation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for ComicError {
    fn from(e: reqwest::Error) -> Self {
        ComicError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for ComicError {
    fn from(e: toml::de::Error) -> Self {
        ComicError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ComicError {
    fn from(e: serde_json::Error) -> Self {
        ComicError::Serialization(e.to_string())
    }
}
