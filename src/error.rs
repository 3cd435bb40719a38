use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgoratuiError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(String),
}

impl From<io::Error> for AgoratuiError {
    fn from(err: io::Error) -> Self {
        AgoratuiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AgoratuiError {
    fn from(err: serde_json::Error) -> Self {
        AgoratuiError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for AgoratuiError {
    fn from(err: reqwest::Error) -> Self {
        AgoratuiError::Http(err.to_string())
    }
}
