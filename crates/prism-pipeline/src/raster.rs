//! The in-memory image buffer shared by every transformation.
//!
//! A [`Raster`] is either single-channel (grayscale) or three-channel
//! (R, G, B in that fixed order). No other channel counts exist, so
//! the type itself carries the channel-count invariant.

use image::{ColorType, GrayImage, RgbImage};

use crate::types::{Dimensions, PipelineError};

/// A decoded raster image with one or three 8-bit channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Raster {
    /// One luma channel.
    Gray(GrayImage),
    /// Three color channels in R, G, B order.
    Rgb(RgbImage),
}

impl Raster {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Gray(img) => img.width(),
            Self::Rgb(img) => img.width(),
        }
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        match self {
            Self::Gray(img) => img.height(),
            Self::Rgb(img) => img.height(),
        }
    }

    /// Number of channels per pixel: 1 or 3.
    #[must_use]
    pub const fn channels(&self) -> u8 {
        match self {
            Self::Gray(_) => 1,
            Self::Rgb(_) => 3,
        }
    }

    /// Width and height together.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Raw interleaved sample bytes.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Self::Gray(img) => img.as_raw(),
            Self::Rgb(img) => img.as_raw(),
        }
    }

    /// Apply a single-channel filter to every channel independently.
    ///
    /// Color images are split into three planes, each plane is filtered,
    /// and the results are reassembled. Every filter used by the pipeline
    /// is per-channel, so this is equivalent to filtering in color space.
    #[must_use = "returns the filtered image"]
    pub fn map_planes(&self, filter: impl Fn(&GrayImage) -> GrayImage) -> Self {
        match self {
            Self::Gray(img) => Self::Gray(filter(img)),
            Self::Rgb(img) => {
                let (w, h) = img.dimensions();
                let planes: [GrayImage; 3] = std::array::from_fn(|c| {
                    GrayImage::from_fn(w, h, |x, y| image::Luma([img.get_pixel(x, y).0[c]]))
                });
                let filtered: [GrayImage; 3] = std::array::from_fn(|c| filter(&planes[c]));
                Self::Rgb(RgbImage::from_fn(w, h, |x, y| {
                    image::Rgb([
                        filtered[0].get_pixel(x, y).0[0],
                        filtered[1].get_pixel(x, y).0[0],
                        filtered[2].get_pixel(x, y).0[0],
                    ])
                }))
            }
        }
    }
}

impl From<GrayImage> for Raster {
    fn from(img: GrayImage) -> Self {
        Self::Gray(img)
    }
}

impl From<RgbImage> for Raster {
    fn from(img: RgbImage) -> Self {
        Self::Rgb(img)
    }
}

/// Decode raw image bytes into a [`Raster`].
///
/// Luma sources (with or without alpha, any bit depth) decode to
/// [`Raster::Gray`]; everything else decodes to [`Raster::Rgb`] with the
/// alpha channel dropped.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty or the
/// decoded image has no pixels.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<Raster, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(PipelineError::EmptyInput);
    }

    let raster = match img.color() {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            Raster::Gray(img.to_luma8())
        }
        _ => Raster::Rgb(img.to_rgb8()),
    };
    log::debug!(
        "decoded {}x{} image with {} channel(s)",
        raster.width(),
        raster.height(),
        raster.channels(),
    );
    Ok(raster)
}
