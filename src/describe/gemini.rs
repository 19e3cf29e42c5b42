//! Gemini (Google) streaming description provider.

use crate::describe::provider::{DescriptionProvider, DescriptionProviderKind, InputPart, TextStream};
use crate::describe::sse;
use crate::error::{sanitize_error_message, BannrError, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

/// Public Gemini API host.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Gemini text model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 1.5 Flash, latest revision.
    #[default]
    Flash15,
    /// Gemini 2.0 Flash.
    Flash20,
    /// Gemini 2.5 Flash.
    Flash25,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash15 => "gemini-1.5-flash-latest",
            Self::Flash20 => "gemini-2.0-flash",
            Self::Flash25 => "gemini-2.5-flash",
        }
    }

    /// Parses an API model identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "gemini-1.5-flash-latest" | "gemini-1.5-flash" => Some(Self::Flash15),
            "gemini-2.0-flash" => Some(Self::Flash20),
            "gemini-2.5-flash" => Some(Self::Flash25),
            _ => None,
        }
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    temperature: Option<f32>,
    base_url: Option<String>,
    ignore_env: bool,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the sampling temperature (default 0.7).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Overrides the API host, e.g. for a proxy.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Uses only the values set on the builder, never the environment.
    pub(crate) fn ignore_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiProvider> {
        let ignore_env = self.ignore_env;
        let api_key = self
            .api_key
            .or_else(|| {
                if ignore_env {
                    None
                } else {
                    std::env::var("GOOGLE_API_KEY").ok()
                }
            })
            .ok_or_else(|| {
                BannrError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(BannrError::InvalidRequest(format!(
                "temperature must be within 0.0..=2.0, got {temperature}"
            )));
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiProvider {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            temperature,
            base_url,
        })
    }
}

/// Gemini streaming text provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    temperature: f32,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url,
            self.model.as_str(),
        )
    }

    fn parse_error(&self, status: u16, text: &str) -> BannrError {
        let text = sanitize_error_message(text);
        if status == 404 {
            return BannrError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            );
        }
        if status == 401 || status == 403 || text.contains("API_KEY_INVALID") {
            return BannrError::Auth(text);
        }
        let lower = text.to_lowercase();
        if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
            return BannrError::ContentBlocked(text);
        }
        BannrError::Api {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl DescriptionProvider for GeminiProvider {
    async fn stream(&self, parts: Vec<InputPart>) -> Result<TextStream> {
        let body = GeminiRequest::from_parts(&parts, self.temperature);
        let images = parts.iter().filter(|p| p.is_image()).count();

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text));
        }

        tracing::debug!(model = self.model.as_str(), images, "Gemini stream opened");

        let chunks = sse::events(Box::pin(response.bytes_stream()))
            .map(|event| event.and_then(|data| text_from_event(&data)))
            .try_filter(|text| futures::future::ready(!text.is_empty()));

        Ok(Box::pin(chunks))
    }

    fn kind(&self) -> DescriptionProviderKind {
        DescriptionProviderKind::Gemini
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/v1beta/models/{}", self.base_url, self.model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(BannrError::Auth("Invalid API key".into())),
            404 => Err(BannrError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(BannrError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Extracts the text carried by one streamed event.
fn text_from_event(data: &str) -> Result<String> {
    let chunk: GeminiStreamChunk = serde_json::from_str(data)
        .map_err(|e| BannrError::Stream(format!("undecodable Gemini event: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(BannrError::Api {
            status: error.code.unwrap_or(500),
            message: sanitize_error_message(&error.message),
        });
    }

    // Blocks arrive with HTTP 200
    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(BannrError::ContentBlocked(format!("Prompt blocked: {reason}")));
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(String::new());
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if matches!(
            reason,
            "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII"
        ) {
            return Err(BannrError::ContentBlocked(format!(
                "Content blocked by Gemini safety filter: {reason}"
            )));
        }
    }

    Ok(candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GeminiConfig {
    temperature: f32,
}

impl GeminiRequest {
    fn from_parts(parts: &[InputPart], temperature: f32) -> Self {
        let parts = parts
            .iter()
            .map(|part| match part {
                InputPart::Image(image) => GeminiRequestPart::InlineData {
                    inline_data: GeminiInlineData {
                        mime_type: image.mime_type().to_string(),
                        data: image.to_base64(),
                    },
                },
                InputPart::Text(text) => GeminiRequestPart::Text { text: text.clone() },
            })
            .collect();

        Self {
            contents: vec![GeminiContent { role: "user", parts }],
            generation_config: GeminiConfig { temperature },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<GeminiApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}
