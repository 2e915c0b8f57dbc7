//! HTTP transport abstraction.
//!
//! All network traffic flows through the [`Transport`] trait so integration
//! tests can substitute a scripted fake for the real HTTP client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::endpoint::Verb;

/// Transport-level failures: no usable response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, DNS, TLS, or timeout failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("invalid response body: {0}")]
    Body(#[from] serde_json::Error),

    /// The request path could not be joined onto the base URL.
    #[error("invalid request path: {0}")]
    InvalidPath(String),
}

/// One outgoing API request, fully described.
///
/// Kept by the cache as a refetch template, so it must be cheap to clone and
/// carry no per-attempt state (the bearer token is attached at send time).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub verb: Verb,
    /// Path relative to the base URL, including any query string.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            verb: Verb::Get,
            path: path.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn write(verb: Verb, path: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            verb,
            path: path.into(),
            body,
        }
    }
}

/// A decoded API response: HTTP status plus parsed JSON body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// Whether the HTTP status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Pluggable request executor.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send a request, attaching `bearer` as an Authorization header when
    /// present. Non-2xx statuses are returned as responses, not errors;
    /// `TransportError` means no response was obtained at all.
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&SecretString>,
    ) -> Result<ApiResponse, TransportError>;
}

/// Production transport over `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport from configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        #[allow(clippy::expect_used)]
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        // `Url::join` drops the last path segment of a slash-less base
        // (`/api/v1` + `parcels` would become `/api/parcels`), so the base
        // path is normalized to end with a slash.
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Self { client, base_url }
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidPath(format!("{path}: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&SecretString>,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path)?;

        let method = match request.verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Patch => reqwest::Method::PATCH,
            Verb::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        if let Some(token) = bearer {
            builder = builder.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            );
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        // Empty bodies (e.g. 204) decode to null rather than failing.
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success_range() {
        let ok = ApiResponse {
            status: 201,
            body: serde_json::Value::Null,
        };
        let not_found = ApiResponse {
            status: 404,
            body: serde_json::Value::Null,
        };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let config = ClientConfig::new(Url::parse("https://api.example.com/v1/").expect("url"));
        let transport = HttpTransport::new(&config);
        let url = transport.url_for("/parcels?page=1").expect("join");
        assert_eq!(url.as_str(), "https://api.example.com/v1/parcels?page=1");
    }

    #[test]
    fn test_base_path_without_trailing_slash_is_kept() {
        let config = ClientConfig::new(Url::parse("https://api.example.com/api/v1").expect("url"));
        let transport = HttpTransport::new(&config);
        let url = transport.url_for("/parcels?page=1").expect("join");
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/parcels?page=1");
    }
}
