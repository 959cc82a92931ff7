//! Shared types for the prism transformation pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// single-channel raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference
/// three-channel raster data without depending on `image` directly.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Errors that can occur during pipeline processing.
///
/// Unrecognized task or stage codes are deliberately absent: they
/// degrade to the identity transformation instead of failing.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty, or decoded to a zero-sized image.
    #[error("input image data is empty")]
    EmptyInput,

    /// A task parameter failed validation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The file name does not carry an allowed image extension.
    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    /// Encoding the output image failed.
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Serde-compatible proxy for `PipelineError`.
///
/// `image::ImageError` cannot be reconstructed from text, so a
/// deserialized `ImageDecode` comes back as a generic decoding error
/// that carries the original message.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    InvalidParameter(String),
    UnsupportedFile(String),
    Encode(String),
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::InvalidParameter(s) => PipelineErrorProxy::InvalidParameter(s.clone()),
            Self::UnsupportedFile(s) => PipelineErrorProxy::UnsupportedFile(s.clone()),
            Self::Encode(s) => PipelineErrorProxy::Encode(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            PipelineErrorProxy::ImageDecode(msg) => {
                Self::ImageDecode(image::ImageError::Decoding(
                    image::error::DecodingError::new(image::error::ImageFormatHint::Unknown, msg),
                ))
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::InvalidParameter(s) => Self::InvalidParameter(s),
            PipelineErrorProxy::UnsupportedFile(s) => Self::UnsupportedFile(s),
            PipelineErrorProxy::Encode(s) => Self::Encode(s),
        })
    }
}
