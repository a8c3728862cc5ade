//! Catalog backend REST client.
//!
//! # Architecture
//!
//! - [`ApiClient`] wraps a `reqwest` client configured once at startup with
//!   the backend base URL and JSON defaults
//! - [`ProductService`] layers typed product operations on top of it and
//!   builds the multipart upload requests
//! - Upload progress is measured by counting bytes as the transport pulls
//!   them from the request body (see `progress`)
//!
//! No request is ever retried; failures surface once to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_web::api::{ApiClient, ProductService};
//!
//! let client = ApiClient::new(&config.api)?;
//! let products = ProductService::new(client);
//!
//! let page = products.get_products(PageRequest::new(1, 12)).await?;
//! ```

mod products;
mod progress;

pub use products::ProductService;
pub use progress::upload_percent;

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the catalog backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// The requested product does not exist.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// JSON encoding or decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built from the base URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status returned by the backend, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::Http(e) => e.status(),
            Self::Parse(_) | Self::InvalidUrl(_) => None,
        }
    }
}

/// HTTP client for the catalog backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    /// Base URL with the `/api/` prefix applied, always ending in `/`.
    api_root: Url,
    timeout: std::time::Duration,
}

impl ApiClient {
    /// Create a client for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed or the base
    /// URL cannot carry the `/api` prefix.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let mut base = config.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let api_root = base
            .join("api/")
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                api_root,
                timeout: config.timeout,
            }),
        })
    }

    /// Build an endpoint URL below `/api/`, percent-encoding each segment.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the base URL cannot have path
    /// segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.api_root.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a GET request. Reads are bounded by the configured timeout.
    #[must_use]
    pub fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.inner.client.get(url).timeout(self.inner.timeout)
    }

    /// Start a POST request.
    ///
    /// Uploads are not bounded by the read timeout; their lifetime is owned
    /// by the upload tracker instead.
    #[must_use]
    pub fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.inner.client.post(url)
    }

    /// Send a request and decode a JSON response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a body
    /// that does not decode as `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send(request).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status,
                message: error_message(status, &body),
            });
        }

        Ok(body)
    }
}

/// Extract a user-facing message from an error response.
///
/// Prefers a JSON `message` or `error` field, then a short plain-text body,
/// and finally a generic status line.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(message) = value.get(key).and_then(serde_json::Value::as_str)
                && !message.trim().is_empty()
            {
                return message.trim().to_string();
            }
        }
    }

    let text = body.trim();
    if !text.is_empty() && !text.starts_with('{') && !text.starts_with('<') {
        return text.chars().take(200).collect();
    }

    format!("Request failed with status code {}", status.as_u16())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::new(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_adds_api_prefix() {
        let url = client("http://localhost:8080").endpoint(&["products"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/products");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("https://gateway.test/catalog")
            .endpoint(&["products", "upload"])
            .unwrap();
        assert_eq!(url.as_str(), "https://gateway.test/catalog/api/products/upload");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let url = client("http://localhost:8080")
            .endpoint(&["products", "a/b c"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/products/a%2Fb%20c");
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        let message = error_message(
            StatusCode::CONFLICT,
            r#"{"message":"Product name already exists"}"#,
        );
        assert_eq!(message, "Product name already exists");
    }

    #[test]
    fn test_error_message_uses_error_field() {
        let message = error_message(StatusCode::BAD_REQUEST, r#"{"error":"bad image"}"#);
        assert_eq!(message, "bad image");
    }

    #[test]
    fn test_error_message_plain_text() {
        let message = error_message(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(message, "upstream down");
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let message = error_message(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(message, "Request failed with status code 500");

        let message = error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(message, "Request failed with status code 502");
    }

    #[test]
    fn test_status_error_displays_message_verbatim() {
        let err = ApiError::Status {
            status: StatusCode::CONFLICT,
            message: "duplicate".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate");
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    }

    #[test]
    fn test_not_found_display() {
        let err = ApiError::NotFound("p-9".to_string());
        assert_eq!(err.to_string(), "Product not found: p-9");
    }
}
