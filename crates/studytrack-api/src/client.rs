//! StudyTrack backend HTTP client
//!
//! Wraps `reqwest::Client` with base URL construction, bearer
//! authentication, a per-request timeout and status-to-error mapping.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use studytrack_api::ApiClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ApiClient::new("https://tracker.example.com", Some("token".into()), Duration::from_secs(30))?;
//! let snapshot: serde_json::Value = client.get_json("/api/data").await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::ApiError;

/// Default timeout applied to every request
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the StudyTrack backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    /// Creates a client for `base_url` with the given token and request timeout
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Creates a client with a custom base URL and the default timeout (useful for testing)
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: Some(access_token.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Updates the access token (e.g., after re-login)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(token.into());
        debug!("Updated ApiClient access token");
    }

    /// Creates an authenticated request builder for `path` relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// `GET path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.request(Method::GET, path).send().await?;
        Self::decode(path, response).await
    }

    /// `POST path` with a JSON body and decode the JSON response
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), "Backend returned error status");
            return Err(ApiError::from_status(status, body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("{path}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::with_base_url("tok", "http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert!(client.has_access_token());
    }

    #[test]
    fn test_new_without_token() {
        let client =
            ApiClient::new("http://localhost:3000", None, Duration::from_secs(5)).unwrap();
        assert!(!client.has_access_token());
    }

    #[test]
    fn test_request_url() {
        let client = ApiClient::with_base_url("tok", "http://localhost:3000");
        let request = client.request(Method::GET, "/api/data").build().unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:3000/api/data");
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer tok"
        );
    }
}
