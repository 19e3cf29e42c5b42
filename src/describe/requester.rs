//! Description Requester: images in, accumulated product description out.

use crate::describe::provider::{DescriptionProvider, InputPart};
use crate::error::Result;
use crate::image::{ImageRef, ImageResolver, ResolvedImage};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// Instruction sent after the images.
pub const PRODUCT_PROMPT: &str = "Meticulously tell what products are present in these images, \
mention brand if present. Answer must only just give info of products separated by commas. ";

/// Sends selected images plus a fixed instruction to a [`DescriptionProvider`]
/// and joins the streamed reply.
pub struct DescriptionRequester {
    provider: Arc<dyn DescriptionProvider>,
    resolver: Arc<dyn ImageResolver>,
    instruction: String,
}

impl DescriptionRequester {
    /// Creates a requester using [`PRODUCT_PROMPT`].
    pub fn new(provider: Arc<dyn DescriptionProvider>, resolver: Arc<dyn ImageResolver>) -> Self {
        Self {
            provider,
            resolver,
            instruction: PRODUCT_PROMPT.to_string(),
        }
    }

    /// Replaces the instruction text.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Returns the instruction text.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &dyn DescriptionProvider {
        self.provider.as_ref()
    }

    /// Resolves every reference, keeping input order and dropping failures.
    pub async fn resolve_all(&self, images: &[ImageRef]) -> Vec<ResolvedImage> {
        let results =
            futures::future::join_all(images.iter().map(|image| self.resolver.resolve(image)))
                .await;

        results
            .into_iter()
            .zip(images)
            .filter_map(|(result, reference)| match result {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!(reference = %reference, "dropping image: {e}");
                    None
                }
            })
            .collect()
    }

    /// Produces the full description for `images`.
    ///
    /// Unresolvable images are skipped. Any failure of the generation call
    /// itself, including one in the middle of the stream, fails the whole call.
    pub async fn describe(&self, images: &[ImageRef]) -> Result<String> {
        let start = Instant::now();
        let resolved = self.resolve_all(images).await;
        let used = resolved.len();
        let parts = build_parts(resolved, &self.instruction);

        let mut stream = self.provider.stream(parts).await?;
        let mut text = String::new();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            text.push_str(&chunk?);
            chunks += 1;
        }

        tracing::info!(
            provider = self.provider.name(),
            submitted = images.len(),
            used,
            chunks,
            duration_ms = start.elapsed().as_millis() as u64,
            "description complete"
        );
        Ok(text)
    }
}

/// Orders request parts: every image first, the instruction last.
pub fn build_parts(images: Vec<ResolvedImage>, instruction: &str) -> Vec<InputPart> {
    images
        .into_iter()
        .map(InputPart::Image)
        .chain(std::iter::once(InputPart::Text(instruction.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::provider::{DescriptionProviderKind, TextStream};
    use crate::error::BannrError;
    use crate::image::ImageFormat;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails for references containing "broken", otherwise returns a 1x1 image
    /// whose first byte is the reference length.
    struct MockResolver;

    #[async_trait]
    impl ImageResolver for MockResolver {
        async fn resolve(&self, reference: &ImageRef) -> Result<ResolvedImage> {
            if reference.as_str().contains("broken") {
                return Err(BannrError::image_resolution(reference.as_str(), "corrupt"));
            }
            Ok(ResolvedImage::new(
                vec![reference.as_str().len() as u8],
                ImageFormat::Jpeg,
                1,
                1,
            ))
        }
    }

    struct MockProvider {
        chunks: Vec<Result<String>>,
        fail_open: bool,
        seen: Mutex<Vec<Vec<InputPart>>>,
    }

    impl MockProvider {
        fn new(chunks: Vec<Result<String>>) -> Self {
            Self {
                chunks,
                fail_open: false,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DescriptionProvider for MockProvider {
        async fn stream(&self, parts: Vec<InputPart>) -> Result<TextStream> {
            self.seen.lock().unwrap().push(parts);
            if self.fail_open {
                return Err(BannrError::Auth("bad key".into()));
            }
            let chunks: Vec<Result<String>> = self
                .chunks
                .iter()
                .map(|c| match c {
                    Ok(text) => Ok(text.clone()),
                    Err(e) => Err(BannrError::Stream(e.to_string())),
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }

        fn kind(&self) -> DescriptionProviderKind {
            DescriptionProviderKind::Other
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn requester(provider: Arc<MockProvider>) -> DescriptionRequester {
        DescriptionRequester::new(provider, Arc::new(MockResolver))
    }

    #[tokio::test]
    async fn test_chunks_are_concatenated_without_separator() {
        let provider = Arc::new(MockProvider::new(vec![
            Ok("Coca-Cola".into()),
            Ok(", Pepsi".into()),
            Ok(", Lays chips".into()),
        ]));
        let text = requester(provider)
            .describe(&[ImageRef::new("a.jpg")])
            .await
            .unwrap();
        assert_eq!(text, "Coca-Cola, Pepsi, Lays chips");
    }

    #[tokio::test]
    async fn test_one_broken_image_out_of_five_is_dropped() {
        let provider = Arc::new(MockProvider::new(vec![Ok("ok".into())]));
        let images: Vec<ImageRef> = ["a.jpg", "bb.jpg", "broken.jpg", "dddd.jpg", "eeeee.jpg"]
            .into_iter()
            .map(ImageRef::from)
            .collect();

        requester(provider.clone()).describe(&images).await.unwrap();

        let seen = provider.seen.lock().unwrap();
        let parts = &seen[0];
        assert_eq!(parts.len(), 5);
        let first_bytes: Vec<u8> = parts
            .iter()
            .filter_map(|p| match p {
                InputPart::Image(image) => Some(image.data[0]),
                InputPart::Text(_) => None,
            })
            .collect();
        assert_eq!(first_bytes, vec![5, 6, 8, 9]);
        assert!(matches!(&parts[4], InputPart::Text(t) if t == PRODUCT_PROMPT));
    }

    #[tokio::test]
    async fn test_no_images_sends_only_instruction() {
        let provider = Arc::new(MockProvider::new(vec![Ok("nothing".into())]));
        requester(provider.clone())
            .with_instruction("custom")
            .describe(&[])
            .await
            .unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 1);
        assert!(matches!(&seen[0][0], InputPart::Text(t) if t == "custom"));
    }

    #[tokio::test]
    async fn test_all_images_broken_still_calls_provider() {
        let provider = Arc::new(MockProvider::new(vec![Ok("guess".into())]));
        let text = requester(provider.clone())
            .describe(&[ImageRef::new("broken-1"), ImageRef::new("broken-2")])
            .await
            .unwrap();

        assert_eq!(text, "guess");
        assert_eq!(provider.seen.lock().unwrap()[0].len(), 1);
    }

    #[tokio::test]
    async fn test_error_mid_stream_fails_whole_description() {
        let provider = Arc::new(MockProvider::new(vec![
            Ok("Coca".into()),
            Err(BannrError::Stream("reset".into())),
            Ok("never".into()),
        ]));
        let result = requester(provider).describe(&[ImageRef::new("a.jpg")]).await;
        assert!(matches!(result, Err(BannrError::Stream(_))));
    }

    #[tokio::test]
    async fn test_error_opening_stream_is_returned() {
        let mut provider = MockProvider::new(vec![]);
        provider.fail_open = true;
        let result = requester(Arc::new(provider)).describe(&[]).await;
        assert!(matches!(result, Err(BannrError::Auth(_))));
    }

    #[test]
    fn test_build_parts_order() {
        let image = ResolvedImage::new(vec![1], ImageFormat::Png, 1, 1);
        let parts = build_parts(vec![image.clone(), image], "describe");
        assert_eq!(parts.len(), 3);
        assert!(parts[0].is_image());
        assert!(parts[1].is_image());
        assert!(!parts[2].is_image());
    }
}
