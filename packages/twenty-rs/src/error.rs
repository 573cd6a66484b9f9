use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwentyError>;

#[derive(Debug, Error)]
pub enum TwentyError {
    #[error("Twenty API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Twenty API key is not configured")]
    MissingApiKey,

    #[error("invalid company id {0:?}: Twenty record ids must be UUIDs")]
    InvalidCompanyId(String),
}
