//! Error types for project sources and configuration.

use thiserror::Error;

/// Errors raised while fetching the project list.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("project store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("failed to decode project list: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading a local project file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Source is missing required settings
    #[error("source not configured: {0}")]
    NotConfigured(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
