//! Errors raised while talking to the remote service

use thiserror::Error;

/// Errors that can occur when communicating with the journal/chat service
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response
    #[error("service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The service answered with an `{error}` payload
    #[error("{0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Whether the failure happened before any response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }
}
