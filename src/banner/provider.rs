//! Banner provider trait and request/response types.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A request to generate a banner. Serializes to `{"prompt": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerRequest {
    /// The text prompt describing the banner.
    pub prompt: String,
}

impl BannerRequest {
    /// Creates a request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Metadata about the generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BannerMetadata {
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A generated banner, referenced by URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[must_use = "generated banner should be displayed or stored"]
pub struct GeneratedBanner {
    /// Where the generated image can be fetched.
    pub image_url: String,
    /// Generation metadata.
    #[serde(default)]
    pub metadata: BannerMetadata,
}

impl GeneratedBanner {
    /// Creates a banner reference.
    pub fn new(image_url: impl Into<String>, metadata: BannerMetadata) -> Self {
        Self {
            image_url: image_url.into(),
            metadata,
        }
    }
}

/// An image-generation endpoint turning a prompt into a banner URL.
#[async_trait]
pub trait BannerProvider: Send + Sync {
    /// Generates a banner for the given request.
    async fn generate(&self, request: &BannerRequest) -> Result<GeneratedBanner>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable.
    async fn health_check(&self) -> Result<()>;
}
