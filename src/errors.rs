use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Feed error from {source_id}: {reason}")]
    Feed { source_id: String, reason: String },

    #[error("Rate limited by {0}")]
    RateLimited(String),
}

impl AppError {
    pub fn feed(source_id: &str, reason: impl Into<String>) -> Self {
        Self::Feed {
            source_id: source_id.to_string(),
            reason: reason.into(),
        }
    }
}
