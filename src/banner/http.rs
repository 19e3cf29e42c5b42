//! JSON-over-HTTP banner provider.
//!
//! Wire contract: `POST {base_url}/` with `{"prompt": "..."}`, answered by
//! `{"image_url": "..."}`.

use crate::banner::provider::{BannerMetadata, BannerProvider, BannerRequest, GeneratedBanner};
use crate::error::{sanitize_error_message, BannrError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Builder for HttpBannerProvider.
#[derive(Debug, Clone, Default)]
pub struct HttpBannerProviderBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    ignore_env: bool,
}

impl HttpBannerProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint base URL. Falls back to `BANNR_BANNER_URL` env var.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets a bearer token. Falls back to `BANNR_BANNER_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets a whole-request timeout. Without one, transport defaults apply.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses only the values set on the builder, never the environment.
    pub(crate) fn ignore_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Builds the provider, resolving the endpoint.
    pub fn build(self) -> Result<HttpBannerProvider> {
        let env = |key: &str| {
            if self.ignore_env {
                None
            } else {
                std::env::var(key).ok()
            }
        };
        let base_url = self
            .base_url
            .clone()
            .or_else(|| env("BANNR_BANNER_URL"))
            .ok_or_else(|| {
                BannrError::Config("BANNR_BANNER_URL not set and no base URL provided".into())
            })?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BannrError::Config(format!(
                "banner base URL must be http(s): {base_url}"
            )));
        }

        let api_key = self
            .api_key
            .clone()
            .or_else(|| env("BANNR_BANNER_API_KEY"))
            .filter(|key| !key.is_empty());

        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(HttpBannerProvider {
            client: client.build()?,
            endpoint: format!("{}/", base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

/// Banner provider for a self-hosted image-generation service.
pub struct HttpBannerProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpBannerProvider {
    /// Creates a new `HttpBannerProviderBuilder`.
    pub fn builder() -> HttpBannerProviderBuilder {
        HttpBannerProviderBuilder::new()
    }

    /// Returns the URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl BannerProvider for HttpBannerProvider {
    async fn generate(&self, request: &BannerRequest) -> Result<GeneratedBanner> {
        let start = Instant::now();

        let response = self
            .authorize(self.client.post(&self.endpoint))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "banner endpoint rejected request");
            return Err(BannrError::Api {
                status: status.as_u16(),
                message: sanitize_error_message(&text),
            });
        }

        let image_url = image_url_from_body(&text)?;
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(url = %image_url, duration_ms, "banner generation complete");

        Ok(GeneratedBanner::new(
            image_url,
            BannerMetadata {
                duration_ms: Some(duration_ms),
            },
        ))
    }

    fn name(&self) -> &str {
        "HTTP image generation"
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .authorize(self.client.get(&self.endpoint))
            .send()
            .await?;

        // Only POST is served, so 404/405 still prove the service is up.
        match response.status().as_u16() {
            401 | 403 => Err(BannrError::Auth("banner endpoint rejected credentials".into())),
            s if s >= 500 => Err(BannrError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BannerResponse {
    #[serde(default)]
    image_url: Option<String>,
}

/// Pulls `image_url` out of a success body.
fn image_url_from_body(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(BannrError::EmptyResponse);
    }

    let body: BannerResponse = serde_json::from_str(text).map_err(|e| {
        BannrError::UnexpectedResponse(format!("malformed banner response: {e}"))
    })?;

    body.image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| BannrError::UnexpectedResponse("response has no image_url".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_normalizes_endpoint() {
        let provider = HttpBannerProviderBuilder::new()
            .base_url("https://banners.example.com/")
            .build()
            .unwrap();
        assert_eq!(provider.endpoint(), "https://banners.example.com/");

        let provider = HttpBannerProviderBuilder::new()
            .base_url("http://localhost:8000")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8000/");
    }

    #[test]
    fn test_builder_rejects_non_http_url() {
        let result = HttpBannerProviderBuilder::new()
            .base_url("ftp://banners.example.com")
            .build();
        assert!(matches!(result, Err(BannrError::Config(_))));
    }

    #[test]
    fn test_ignore_env_requires_explicit_url() {
        let result = HttpBannerProviderBuilder::new().ignore_env().build();
        assert!(matches!(result, Err(BannrError::Config(_))));

        let provider = HttpBannerProviderBuilder::new()
            .ignore_env()
            .base_url("http://localhost:8000")
            .build()
            .unwrap();
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let provider = HttpBannerProviderBuilder::new()
            .base_url("http://localhost:8000")
            .api_key("")
            .build()
            .unwrap();
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_image_url_from_body() {
        assert_eq!(
            image_url_from_body(r#"{"image_url": "https://x/y.png"}"#).unwrap(),
            "https://x/y.png"
        );
        assert_eq!(
            image_url_from_body(r#"{"image_url": "https://x/y.png", "seed": 7}"#).unwrap(),
            "https://x/y.png"
        );
    }

    #[test]
    fn test_empty_body_is_distinct_failure() {
        assert!(matches!(image_url_from_body(""), Err(BannrError::EmptyResponse)));
        assert!(matches!(image_url_from_body("  \n"), Err(BannrError::EmptyResponse)));
    }

    #[test]
    fn test_missing_or_blank_image_url() {
        assert!(matches!(
            image_url_from_body(r#"{"url": "https://x/y.png"}"#),
            Err(BannrError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            image_url_from_body(r#"{"image_url": ""}"#),
            Err(BannrError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            image_url_from_body(r#"{"image_url": null}"#),
            Err(BannrError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            image_url_from_body("<html>gateway</html>"),
            Err(BannrError::UnexpectedResponse(_))
        ));
    }
}
