use thiserror::Error;

#[derive(Debug, Error)]
pub enum SquareError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Square returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode Square response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("missing Square access token")]
    MissingToken,
}

pub type Result<T> = std::result::Result<T, SquareError>;
