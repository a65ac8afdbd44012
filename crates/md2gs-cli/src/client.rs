//! HTTP client for the Google Slides REST API

use std::time::Duration;

use async_trait::async_trait;
use md2gs_slides::wire::BatchUpdateRequest;
use md2gs_slides::{BatchUpdateResponse, PresentationClient, Presentation, Request, Result, SlidesError};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Default Slides API endpoint
pub const DEFAULT_API_URL: &str = "https://slides.googleapis.com/v1/presentations";

/// Client authenticating with a bearer token
#[derive(Debug, Clone)]
pub struct SlidesClient {
    /// Base URL of the presentations collection
    base_url: String,
    token: String,
    client: Client,
}

impl SlidesClient {
    /// Create a client for the public API
    pub fn new(token: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_url(DEFAULT_API_URL, token)
    }

    /// Create a client for a custom endpoint
    pub fn with_url(base_url: impl Into<String>, token: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, token, Duration::from_secs(60))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn presentation_url(&self, presentation_id: &str) -> String {
        format!("{}/{}", self.base_url, presentation_id)
    }

    pub fn batch_update_url(&self, presentation_id: &str) -> String {
        format!("{}/{}:batchUpdate", self.base_url, presentation_id)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        presentation_id: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SlidesError::remote(operation, presentation_id, None, e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SlidesError::remote(operation, presentation_id, Some(status.as_u16()), e.to_string())
        })?;
        if !status.is_success() {
            return Err(SlidesError::remote(
                operation,
                presentation_id,
                Some(status.as_u16()),
                error_message(&body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            SlidesError::remote(
                operation,
                presentation_id,
                Some(status.as_u16()),
                format!("unreadable response: {e}"),
            )
        })
    }
}

/// Message of a Google API error body, or the body itself
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                "Unknown error".to_string()
            } else {
                body.to_string()
            }
        })
}

#[async_trait]
impl PresentationClient for SlidesClient {
    async fn get(&self, presentation_id: &str) -> Result<Presentation> {
        let url = self.presentation_url(presentation_id);
        debug!(%url, "Fetching presentation");
        self.send("get", presentation_id, self.client.get(&url)).await
    }

    async fn batch_update(
        &self,
        presentation_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse> {
        let url = self.batch_update_url(presentation_id);
        debug!(%url, requests = requests.len(), "Sending batch update");
        let body = BatchUpdateRequest { requests };
        self.send("batchUpdate", presentation_id, self.client.post(&url).json(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = SlidesClient::with_url("https://example.com/v1/presentations/", "t").unwrap();
        assert_eq!(client.base_url(), "https://example.com/v1/presentations");
        assert_eq!(client.presentation_url("abc"), "https://example.com/v1/presentations/abc");
        assert_eq!(
            client.batch_update_url("abc"),
            "https://example.com/v1/presentations/abc:batchUpdate"
        );
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"code": 400, "message": "Invalid requests[0].insertText", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "Invalid requests[0].insertText");
        assert_eq!(error_message("Bad gateway\n"), "Bad gateway");
        assert_eq!(error_message(""), "Unknown error");
    }
}
