//! Color-to-luma reduction.
//!
//! [`to_gray`] is the implicit reduction every single-channel operation
//! (thresholds, Laplacian, Canny) performs on its input before running.
//! [`grayscale`] is the user-facing transformation (task 1) built on it.

use image::{GrayImage, RgbImage};

use crate::raster::Raster;

/// BT.601 luma in 14-bit fixed point: `0.299*R + 0.587*G + 0.114*B`.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const SHIFT: u32 = 14;
    let y = (r as u32 * R + g as u32 * G + b as u32 * B + (1 << (SHIFT - 1))) >> SHIFT;
    #[allow(clippy::cast_possible_truncation)]
    {
        y as u8
    }
}

/// Reduce an RGB image to a single luma channel.
#[must_use = "returns the grayscale image"]
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        image::Luma([luma(r, g, b)])
    })
}

/// Reduce any raster to a single channel. Gray input is returned as-is.
#[must_use = "returns the grayscale image"]
pub fn to_gray(image: &Raster) -> GrayImage {
    match image {
        Raster::Gray(img) => img.clone(),
        Raster::Rgb(img) => rgb_to_gray(img),
    }
}

/// Grayscale transformation: always yields a single-channel raster.
#[must_use = "returns the grayscale image"]
pub fn grayscale(image: &Raster) -> Raster {
    Raster::Gray(to_gray(image))
}
