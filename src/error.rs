//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(reqwest::Error),

    #[error("Gemini API error (status {status}): {detail}")]
    Upstream { status: u16, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// reqwest includes the request URL in its Display output, and the outbound URL
// carries the API key as a query parameter.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.without_url())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
