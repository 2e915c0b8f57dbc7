//! Unified error types for the client layer.
//!
//! Form-level validation errors never reach this layer; they are handled by
//! the dashboard crate before a request is issued.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session is active but the operation requires one.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Login rejected by the backend (wrong email or password).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The backend rejected the bearer token (expired or revoked).
    /// The session has been torn down by the time this surfaces.
    #[error("token expired or rejected")]
    TokenRejected,

    /// Login response was missing the token or user payload.
    #[error("malformed login response: {0}")]
    MalformedLogin(String),

    /// Session file could not be read, written, or parsed.
    #[error("session storage error: {0}")]
    Storage(String),
}

/// Application-level error type for the API client.
///
/// Every variant returns control to an interactive state: network and API
/// errors surface as retryable error states in the view layer, auth errors
/// escalate to the session gate.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure - no usable response was received.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// The server responded with a non-2xx status or `success: false`.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code (0 when the failure was envelope-level only).
        status: u16,
        /// User-visible message derived from the response payload.
        message: String,
    },

    /// Authentication failure.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Response body did not match the endpoint's declared shape.
    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Network errors are retryable; auth and decode errors are not, and API
    /// errors require the caller to change the request first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::Api {
            status: 422,
            message: "tracking number not found".to_string(),
        };
        assert_eq!(err.to_string(), "api error (422): tracking number not found");
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            ClientError::Auth(AuthError::TokenRejected).to_string(),
            "auth error: token expired or rejected"
        );
    }

    #[test]
    fn test_retryable_classification() {
        let api = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!api.is_retryable());
        assert!(!ClientError::Auth(AuthError::NotAuthenticated).is_retryable());
    }
}
