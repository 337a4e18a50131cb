//! Error types for the RentKub API client.
//!
//! # Design
//! `NotFound` and `Unauthorized` get dedicated variants because callers
//! routinely branch on "the listing is gone" and "sign in again". Every other
//! non-2xx response lands in `Http` with the status, the backend's
//! `message` field when it sent one, and the raw body for debugging.
//! A body that does not match the expected shape is a `Deserialization`
//! error rather than a silently defaulted value.

use thiserror::Error;

/// Errors returned by `RentkubClient` parse methods and session actions.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned 401; the bearer token is missing or expired.
    #[error("unauthorized")]
    Unauthorized,

    /// The server returned a non-2xx status other than 401 and 404.
    #[error("HTTP {status}: {}", http_detail(.message, .body))]
    Http {
        status: u16,
        message: Option<String>,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The caller supplied an argument the endpoint cannot accept.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The host transport produced no response.
    #[error("transport failed: {0}")]
    Transport(String),
}

fn http_detail<'a>(message: &'a Option<String>, body: &'a str) -> &'a str {
    message.as_deref().unwrap_or(body)
}

impl ApiError {
    /// The backend-supplied message, if the error carries one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
