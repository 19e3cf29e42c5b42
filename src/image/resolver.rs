//! Turns image references into upload-sized pixel data.

use crate::error::{BannrError, Result};
use crate::image::types::{ImageFormat, ImageRef, ResolvedImage};
use ::image::codecs::jpeg::JpegEncoder;
use ::image::imageops::FilterType;
use ::image::GenericImageView;
use async_trait::async_trait;

/// Default bound for the long edge of uploaded images, in pixels.
pub const DEFAULT_MAX_EDGE: u32 = 768;

const JPEG_QUALITY: u8 = 85;

/// Resolves opaque image references into pixel data.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Loads and prepares the image behind `reference`.
    async fn resolve(&self, reference: &ImageRef) -> Result<ResolvedImage>;
}

/// Resolver for local files and `http(s)` URLs.
///
/// Images whose long edge exceeds `max_edge` are scaled down (aspect ratio
/// preserved) and re-encoded as JPEG. Smaller images are passed through as-is.
#[derive(Debug, Clone)]
pub struct LocalImageResolver {
    client: reqwest::Client,
    max_edge: u32,
}

impl Default for LocalImageResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalImageResolver {
    /// Creates a resolver bounded to [`DEFAULT_MAX_EDGE`].
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            max_edge: DEFAULT_MAX_EDGE,
        }
    }

    /// Sets the long-edge bound in pixels.
    pub fn with_max_edge(mut self, max_edge: u32) -> Self {
        self.max_edge = max_edge.max(1);
        self
    }

    /// Returns the long-edge bound in pixels.
    pub fn max_edge(&self) -> u32 {
        self.max_edge
    }

    async fn load_bytes(&self, reference: &ImageRef) -> Result<Vec<u8>> {
        match reference.to_path() {
            Some(path) => Ok(tokio::fs::read(path).await?),
            None => {
                let response = self.client.get(reference.as_str()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(BannrError::Api {
                        status: status.as_u16(),
                        message: "image download failed".into(),
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}

#[async_trait]
impl ImageResolver for LocalImageResolver {
    async fn resolve(&self, reference: &ImageRef) -> Result<ResolvedImage> {
        let data = self
            .load_bytes(reference)
            .await
            .map_err(|e| BannrError::image_resolution(reference.as_str(), e))?;

        let max_edge = self.max_edge;
        let image = tokio::task::spawn_blocking(move || fit_to_edge(data, max_edge))
            .await
            .map_err(|e| BannrError::image_resolution(reference.as_str(), e))?
            .map_err(|e| BannrError::image_resolution(reference.as_str(), e))?;

        tracing::debug!(
            reference = %reference,
            width = image.width,
            height = image.height,
            bytes = image.data.len(),
            "resolved image"
        );
        Ok(image)
    }
}

/// Decodes `data` and bounds its long edge to `max_edge`.
fn fit_to_edge(data: Vec<u8>, max_edge: u32) -> Result<ResolvedImage> {
    let decoded = ::image::load_from_memory(&data).map_err(|e| BannrError::Decode(e.to_string()))?;
    let (width, height) = decoded.dimensions();

    if width.max(height) <= max_edge {
        if let Some(format) = ImageFormat::from_magic_bytes(&data) {
            return Ok(ResolvedImage::new(data, format, width, height));
        }
    }

    let scaled = if width.max(height) > max_edge {
        decoded.resize(max_edge, max_edge, FilterType::Lanczos3)
    } else {
        decoded
    };

    let rgb = scaled.to_rgb8();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| BannrError::Decode(e.to_string()))?;

    Ok(ResolvedImage::new(
        encoded,
        ImageFormat::Jpeg,
        rgb.width(),
        rgb.height(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage};
    use std::path::Path;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> ImageRef {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([200, 30, 30]))
            .save(&path)
            .unwrap();
        ImageRef::from(path)
    }

    #[tokio::test]
    async fn test_large_image_is_downscaled_to_max_edge() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_png(dir.path(), "wide.png", 2000, 1000);

        let image = LocalImageResolver::new().resolve(&reference).await.unwrap();

        assert_eq!((image.width, image.height), (768, 384));
        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_magic_bytes(&image.data), Some(ImageFormat::Jpeg));
    }

    #[tokio::test]
    async fn test_small_image_passes_through_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_png(dir.path(), "small.png", 100, 50);
        let original = std::fs::read(reference.to_path().unwrap()).unwrap();

        let image = LocalImageResolver::new().resolve(&reference).await.unwrap();

        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!((image.width, image.height), (100, 50));
        assert_eq!(image.data, original);
    }

    #[tokio::test]
    async fn test_custom_max_edge_on_portrait_image() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_png(dir.path(), "tall.png", 200, 400);

        let resolver = LocalImageResolver::new().with_max_edge(100);
        let image = resolver.resolve(&reference).await.unwrap();

        assert_eq!((image.width, image.height), (50, 100));
    }

    #[tokio::test]
    async fn test_file_uri_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_png(dir.path(), "uri.png", 10, 10);
        let uri = ImageRef::new(format!("file://{}", reference.as_str()));

        assert!(LocalImageResolver::new().resolve(&uri).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_resolution_error() {
        let err = LocalImageResolver::new()
            .resolve(&ImageRef::new("/definitely/not/here.jpg"))
            .await
            .unwrap_err();

        match err {
            BannrError::ImageResolution { reference, .. } => {
                assert_eq!(reference, "/definitely/not/here.jpg");
            }
            other => panic!("expected ImageResolution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_image_bytes_are_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not pixels").unwrap();

        let err = LocalImageResolver::new()
            .resolve(&ImageRef::from(path))
            .await
            .unwrap_err();

        assert!(matches!(err, BannrError::ImageResolution { .. }));
    }

    #[test]
    fn test_max_edge_never_zero() {
        assert_eq!(LocalImageResolver::new().with_max_edge(0).max_edge(), 1);
    }
}
