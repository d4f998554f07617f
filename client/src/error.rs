//! Error types for the collection API client

use thiserror::Error;

/// Errors that can occur when talking to the collection API
///
/// `Clone` so failures can travel inside sync actions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Client configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Server rejected the input (400)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Todo does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure or timeout; nothing was received
    #[error("Request failed: {0}")]
    Transport(String),

    /// Any other non-200 status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Error message from the response body
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Response parsing failed: {0}")]
    Decode(String),
}
