//! The typed endpoint catalogue.
//!
//! Endpoint structs are grouped by domain: parcels, users, auth. Each module
//! also extends [`crate::ApiClient`] with convenience methods so callers
//! never spell out endpoint types at the call site.

pub mod auth;
pub mod parcels;
pub mod users;

use parcelflow_core::ApiEnvelope;

use crate::error::{ClientError, Result};

/// Unwrap an envelope that must carry data, surfacing the backend message
/// when it does not.
pub(crate) fn require_data<T>(envelope: ApiEnvelope<T>) -> Result<T> {
    match envelope.data {
        Some(data) => Ok(data),
        None => Err(ClientError::Api {
            status: 0,
            message: envelope
                .message
                .unwrap_or_else(|| "response missing data".to_string()),
        }),
    }
}
