//! Output artifacts: naming and encoding.
//!
//! Artifact names are derived from the source name alone, never from
//! content or time, so re-running on the same source overwrites the
//! previous output.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};

use crate::raster::Raster;
use crate::types::PipelineError;

/// Prefix prepended to the source name.
pub const ARTIFACT_PREFIX: &str = "processed_";

/// JPEG quality used when re-encoding.
pub const JPEG_QUALITY: u8 = 95;

/// The result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// The transformed image.
    pub image: Raster,
    /// Encoded histogram summary. Nothing populates this yet.
    pub histogram: Option<String>,
}

impl OutputArtifact {
    /// Wrap a transformed image with no histogram attached.
    #[must_use]
    pub const fn new(image: Raster) -> Self {
        Self {
            image,
            histogram: None,
        }
    }
}

/// Encoded image formats an artifact can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Pick the format from a file name's extension, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnsupportedFile`] if the name has no
    /// extension or the extension is not png, jpg or jpeg.
    pub fn from_name(name: &str) -> Result<Self, PipelineError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| PipelineError::UnsupportedFile(name.to_owned()))?;
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(PipelineError::UnsupportedFile(name.to_owned())),
        }
    }
}

/// The artifact name for a source file: `processed_<basename>`.
///
/// Any directory components of `source_name` are discarded.
#[must_use]
pub fn artifact_name(source_name: &str) -> String {
    let base = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name);
    format!("{ARTIFACT_PREFIX}{base}")
}

/// Encode `image` in `format`.
///
/// # Errors
///
/// Returns [`PipelineError::Encode`] if the encoder rejects the buffer.
pub fn encode(image: &Raster, format: OutputFormat) -> Result<Vec<u8>, PipelineError> {
    let color = match image {
        Raster::Gray(_) => ExtendedColorType::L8,
        Raster::Rgb(_) => ExtendedColorType::Rgb8,
    };
    let mut buf = Vec::new();
    let result = match format {
        OutputFormat::Png => PngEncoder::new(&mut buf).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            color,
        ),
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            color,
        ),
    };
    result.map_err(|e| PipelineError::Encode(e.to_string()))?;
    log::debug!("encoded {format:?} artifact, {} bytes", buf.len());
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::raster::decode;
    use image::{GrayImage, RgbImage};

    #[test]
    fn name_is_prefixed() {
        assert_eq!(artifact_name("photo.png"), "processed_photo.png");
    }

    #[test]
    fn name_is_deterministic() {
        assert_eq!(artifact_name("a.jpg"), artifact_name("a.jpg"));
    }

    #[test]
    fn name_drops_directories() {
        assert_eq!(artifact_name("uploads/cat.JPG"), "processed_cat.JPG");
        assert_eq!(artifact_name(r"C:\pics\dog.jpeg"), "processed_dog.jpeg");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_name("x.png").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_name("x.PNG").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_name("x.jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_name("x.JpEg").unwrap(), OutputFormat::Jpeg);
    }

    #[test]
    fn format_rejects_other_extensions() {
        for name in ["x.gif", "x.bmp", "noext", "png"] {
            assert!(
                matches!(OutputFormat::from_name(name), Err(PipelineError::UnsupportedFile(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let img = Raster::Rgb(RgbImage::from_fn(5, 3, |x, y| {
            image::Rgb([u8::try_from(x * 40).unwrap(), u8::try_from(y * 70).unwrap(), 9])
        }));
        let bytes = encode(&img, OutputFormat::Png).unwrap();
        assert_eq!(decode(&bytes).unwrap(), img);
    }

    #[test]
    fn gray_png_stays_gray() {
        let img = Raster::Gray(GrayImage::from_pixel(4, 4, image::Luma([77])));
        let bytes = encode(&img, OutputFormat::Png).unwrap();
        assert_eq!(decode(&bytes).unwrap().channels(), 1);
    }

    #[test]
    fn jpeg_keeps_dimensions() {
        let img = Raster::Rgb(RgbImage::from_pixel(16, 8, image::Rgb([120, 60, 30])));
        let bytes = encode(&img, OutputFormat::Jpeg).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(back.dimensions(), img.dimensions());
        assert_eq!(back.channels(), 3);
    }

    #[test]
    fn new_artifact_has_no_histogram() {
        let artifact = OutputArtifact::new(Raster::Gray(GrayImage::new(1, 1)));
        assert!(artifact.histogram.is_none());
    }
}
