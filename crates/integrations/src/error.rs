use creative_core::CreativeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdNetworkError>;

#[derive(Debug, Error)]
pub enum AdNetworkError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<AdNetworkError> for CreativeError {
    fn from(err: AdNetworkError) -> Self {
        match err {
            AdNetworkError::Auth(message) => CreativeError::Auth(message),
            other => CreativeError::Internal(anyhow::Error::new(other)),
        }
    }
}
