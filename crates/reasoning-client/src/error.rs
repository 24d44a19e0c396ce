use thiserror::Error;

use osint_core::OsintError;

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("API key not found: set {0}")]
    MissingApiKey(String),

    #[error("provider '{0}' has no HTTP client")]
    UnsupportedProvider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{0} returned no text content")]
    EmptyResponse(String),
}

impl From<ReasoningError> for OsintError {
    fn from(e: ReasoningError) -> Self {
        OsintError::Gateway(e.to_string())
    }
}
