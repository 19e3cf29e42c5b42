//! Error types for the banner pipeline.

/// Longest provider error body carried inside an error, in characters.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Errors that can occur while describing images or generating a banner.
#[derive(Debug, thiserror::Error)]
pub enum BannrError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Endpoint answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body or provider message.
        message: String,
    },

    /// Endpoint answered with success but no body.
    #[error("empty response body")]
    EmptyResponse,

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Content was blocked by provider safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters (unknown model, bad URL, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A single image reference could not be turned into pixel data.
    #[error("failed to resolve image {reference}: {reason}")]
    ImageResolution {
        /// The reference that failed.
        reference: String,
        /// Why it failed.
        reason: String,
    },

    /// Streamed response broke off or carried an undecodable event.
    #[error("stream error: {0}")]
    Stream(String),

    /// Missing or unparseable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode or encode image data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading an image file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A submission was made with no tokio runtime to run it on.
    #[error("no async runtime: {0}")]
    Runtime(String),
}

impl BannrError {
    /// Builds an [`BannrError::ImageResolution`] for `reference`.
    pub fn image_resolution(reference: impl Into<String>, reason: impl ToString) -> Self {
        Self::ImageResolution {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the failure happened before any request reached the endpoint
    /// because of local setup (keys, URLs, settings).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Auth(_))
    }
}

/// Collapses whitespace in a provider error body and truncates it.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
    truncated.push('…');
    truncated
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, BannrError>;
