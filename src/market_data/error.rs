//! Failures from the remote market-data API.

use thiserror::Error;

/// A terminal fetch failure. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// Request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// API answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
