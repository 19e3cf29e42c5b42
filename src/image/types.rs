//! Core types for selected and resolved images.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque handle to a user-selected image.
///
/// A file system path, a `file://` URI or an `http(s)://` URL. The handle
/// itself is never interpreted outside an [`ImageResolver`](super::ImageResolver).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Creates a reference from any string-like handle.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the raw handle.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the handle points at a remote resource.
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }

    /// Returns the local path for file handles, stripping a `file://` scheme.
    pub fn to_path(&self) -> Option<PathBuf> {
        if self.is_remote() {
            return None;
        }
        let raw = self.0.strip_prefix("file://").unwrap_or(&self.0);
        Some(PathBuf::from(raw))
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&Path> for ImageRef {
    fn from(value: &Path) -> Self {
        Self::new(value.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for ImageRef {
    fn from(value: PathBuf) -> Self {
        Self::from(value.as_path())
    }
}

/// Encodings accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    #[default]
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Pixel data ready to be uploaded to the description endpoint.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Encoding of `data`.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ResolvedImage {
    /// Creates a resolved image.
    pub fn new(data: Vec<u8>, format: ImageFormat, width: u32, height: u32) -> Self {
        Self {
            data,
            format,
            width,
            height,
        }
    }

    /// Returns the MIME type of the encoded data.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Returns the longer of width and height.
    pub fn long_edge(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a......"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8]), None);
    }

    #[test]
    fn test_image_ref_paths() {
        assert_eq!(
            ImageRef::new("file:///tmp/a.jpg").to_path(),
            Some(PathBuf::from("/tmp/a.jpg"))
        );
        assert_eq!(
            ImageRef::new("shots/b.png").to_path(),
            Some(PathBuf::from("shots/b.png"))
        );
        assert!(ImageRef::new("https://cdn.example.com/c.webp").to_path().is_none());
        assert!(ImageRef::new("http://localhost/d.png").is_remote());
    }

    #[test]
    fn test_image_ref_serializes_as_string() {
        let json = serde_json::to_string(&ImageRef::new("a.jpg")).unwrap();
        assert_eq!(json, "\"a.jpg\"");
    }

    #[test]
    fn test_resolved_image_base64() {
        let image = ResolvedImage::new(vec![1, 2, 3], ImageFormat::Png, 4, 2);
        assert_eq!(image.to_base64(), "AQID");
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.long_edge(), 4);
    }
}
