//! StudyTrack API - Backend HTTP client
//!
//! Provides the async client for the StudyTrack backend and the
//! `IRemoteGateway` adapter the sync engine talks to.
//!
//! ## Modules
//!
//! - [`client`] - Authenticated JSON HTTP client
//! - [`gateway`] - `IRemoteGateway` implementation over the client

pub mod client;
pub mod gateway;

pub use client::ApiClient;
pub use gateway::HttpRemoteGateway;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the StudyTrack backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// The access token is missing, invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The token is valid but not allowed to perform the request
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The endpoint does not exist on this backend
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the payload (4xx other than the above)
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred (connect, timeout, TLS)
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Maps a non-success status and its body to an error
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let message = if body.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        } else {
            body
        };

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            s if s.is_server_error() => ApiError::ServerError(message),
            s => ApiError::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// True for errors that may succeed if the same request is sent later
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::ServerError(_) => true,
            ApiError::NetworkError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
