//! The JSON response envelope shared by every backend endpoint.

use serde::{Deserialize, Serialize};

/// Standard response wrapper: `{ success, data?, count?, message?, token?, refresh_token? }`.
///
/// `count` carries the total matching row count for paginated list endpoints,
/// which is what the pagination layer clamps against. `token` and
/// `refresh_token` only appear on auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

// `#[serde(default)]` on a generic field requires T: Default; this helper
// avoids that bound.
fn none<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T> {
    /// Build a minimal success envelope around a payload.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
            token: None,
            refresh_token: None,
        }
    }

    /// Build a failure envelope carrying only a message.
    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            message: Some(message.into()),
            token: None,
            refresh_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_defaults_optional_fields() {
        let env: ApiEnvelope<Vec<String>> =
            serde_json::from_value(serde_json::json!({ "success": true })).expect("deserialize");
        assert!(env.success);
        assert!(env.data.is_none());
        assert!(env.count.is_none());
        assert!(env.message.is_none());
    }

    #[test]
    fn test_envelope_with_count() {
        let env: ApiEnvelope<Vec<u32>> = serde_json::from_value(serde_json::json!({
            "success": true,
            "data": [1, 2, 3],
            "count": 47
        }))
        .expect("deserialize");
        assert_eq!(env.count, Some(47));
        assert_eq!(env.data.as_deref(), Some([1, 2, 3].as_slice()));
    }
}
