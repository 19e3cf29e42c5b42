//! Product description from images via a streaming multimodal model.

mod gemini;
mod provider;
mod requester;
mod sse;

pub use gemini::{
    GeminiModel, GeminiProvider, GeminiProviderBuilder, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_TEMPERATURE,
};
pub use provider::{DescriptionProvider, DescriptionProviderKind, InputPart, TextStream};
pub use requester::{build_parts, DescriptionRequester, PRODUCT_PROMPT};
