//! Error types shared by the crawler, the history store and the LLM client.
//!
//! Most of these never leave the component that produced them: network,
//! persistence and classification failures are logged and replaced by a
//! fallback value at the call boundary. Only [`MonitorError::Config`] (and the
//! I/O or parse errors raised while reading the catalog) abort a run.

use thiserror::Error;

/// Errors that can occur while monitoring policy sources.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The source catalog is missing, empty or otherwise unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem read or write failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML catalog could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport failed (connect, timeout, body read).
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// A URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A source names a character encoding `encoding_rs` does not know.
    #[error("Unknown encoding label: {0}")]
    Encoding(String),

    /// The LLM endpoint answered without any message content.
    #[error("Empty completion from {0}")]
    EmptyCompletion(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
