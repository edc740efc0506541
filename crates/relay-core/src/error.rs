//! Error types for relay-core

use thiserror::Error;

/// Startup-time error for relay-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load context document {path}: {source}")]
    Context {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Result type alias for relay-core
pub type Result<T> = std::result::Result<T, Error>;
