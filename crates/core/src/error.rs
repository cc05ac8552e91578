use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("invalid response from {backend} ({status}): {details}")]
    BackendResponse {
        backend: String,
        status: u16,
        details: String,
    },

    #[error("invalid query template: {0}")]
    InvalidTemplate(String),

    #[error("keywords could not be loaded from file {path}: {reason}")]
    Dictionary { path: String, reason: String },

    #[error("invalid search result page: {0}")]
    InvalidPage(String),

    #[error("invalid content id: {0}")]
    InvalidContentId(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("scan cancelled")]
    Cancelled,
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;
