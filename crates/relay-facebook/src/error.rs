//! Error types for relay-facebook

use thiserror::Error;

/// relay-facebook error type
#[derive(Error, Debug)]
pub enum FacebookError {
    #[error("Webhook verification request is missing hub.mode or hub.verify_token")]
    MissingVerifyParams,

    #[error("Facebook webhook verification failed")]
    WebhookVerificationFailed,

    #[error("Facebook API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Webhook server error: {0}")]
    Server(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FacebookError>;
