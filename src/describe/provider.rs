//! Description provider trait and request parts.

use crate::error::Result;
use crate::image::ResolvedImage;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Text chunks streamed back by a description provider, in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One part of a multimodal request.
#[derive(Debug, Clone)]
pub enum InputPart {
    /// Inline image data.
    Image(ResolvedImage),
    /// Plain text.
    Text(String),
}

impl InputPart {
    /// Returns true for image parts.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

/// Description provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionProviderKind {
    /// Google Gemini.
    Gemini,
    /// Anything else (test doubles, proxies).
    Other,
}

/// A hosted multimodal model that streams text for image + text input.
#[async_trait]
pub trait DescriptionProvider: Send + Sync {
    /// Starts a streaming generation for `parts`.
    ///
    /// Errors before the first chunk are returned directly; errors after
    /// that arrive as items of the stream.
    async fn stream(&self, parts: Vec<InputPart>) -> Result<TextStream>;

    /// Returns the kind of this provider.
    fn kind(&self) -> DescriptionProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.kind() {
            DescriptionProviderKind::Gemini => "Gemini (Google)",
            DescriptionProviderKind::Other => "custom",
        }
    }

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
