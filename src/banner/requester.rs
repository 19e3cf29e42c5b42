//! Banner Requester: description in, banner URL out.

use crate::banner::prompt::build_banner_prompt;
use crate::banner::provider::{BannerProvider, BannerRequest, GeneratedBanner};
use crate::error::Result;
use std::sync::Arc;

/// Builds the banner prompt and issues exactly one generation request.
///
/// Calls are independent: nothing is deduplicated, cancelled or retried.
pub struct BannerRequester {
    provider: Arc<dyn BannerProvider>,
}

impl BannerRequester {
    /// Creates a requester for `provider`.
    pub fn new(provider: Arc<dyn BannerProvider>) -> Self {
        Self { provider }
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &dyn BannerProvider {
        self.provider.as_ref()
    }

    /// Requests a banner for `description`, optionally customized.
    pub async fn request(
        &self,
        description: &str,
        customization: Option<&str>,
    ) -> Result<GeneratedBanner> {
        let request = BannerRequest::new(build_banner_prompt(description, customization));
        tracing::debug!(
            provider = self.provider.name(),
            prompt_len = request.prompt.len(),
            "requesting banner"
        );
        self.provider.generate(&request).await
    }
}
