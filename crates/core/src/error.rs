use thiserror::Error;

use crate::types::Platform;

pub type CreativeResult<T> = Result<T, CreativeError>;

#[derive(Error, Debug)]
pub enum CreativeError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Duplicate asset skipped: {name}")]
    DuplicateAsset { name: String },

    #[error("Persistence error on key '{key}': {message}")]
    Persistence { key: String, message: String },

    #[error("Network read failed, using fallback data: {0}")]
    NetworkFallback(String),

    #[error("Publish job for {platform} failed: {message}")]
    JobFailure { platform: Platform, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CreativeError {
    pub fn persistence(key: &str, message: impl ToString) -> Self {
        CreativeError::Persistence {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the error should be shown to the user rather than absorbed
    /// and logged locally.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, CreativeError::Auth(_) | CreativeError::JobFailure { .. })
    }
}
