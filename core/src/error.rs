use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request to the backend failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend responded with HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("Backend responded with malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend responded with malformed base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Log directory does not exist: {0}")]
    LogPathNotFound(PathBuf),

    #[error("Dispatcher could not start: {0}")]
    Runtime(std::io::Error),

    #[error("Dispatched call did not complete")]
    Dispatch,
}

pub type Result<T> = std::result::Result<T, Error>;
