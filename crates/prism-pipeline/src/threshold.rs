//! Binary thresholding: global, Otsu, and adaptive.
//!
//! Every operation here reduces its input to grayscale first and
//! produces a binary image (0 or 255).

use image::GrayImage;
use imageproc::contrast::{ThresholdType, otsu_level, threshold};

use crate::blur::{box_blur, gaussian_blur};
use crate::grayscale::to_gray;
use crate::kernel::KernelSize;
use crate::raster::Raster;

/// Fixed cutoff for [`global_threshold`]: pixels above it become white.
pub const GLOBAL_CUTOFF: u8 = 127;

/// Neighborhood side length for the adaptive thresholds.
pub const ADAPTIVE_BLOCK: KernelSize = KernelSize::fixed(11);

/// Amount subtracted from the local mean before comparing.
pub const ADAPTIVE_OFFSET: i16 = 2;

/// Binarize at [`GLOBAL_CUTOFF`].
#[must_use = "returns the binary image"]
pub fn global_threshold(image: &Raster) -> GrayImage {
    threshold(&to_gray(image), GLOBAL_CUTOFF, ThresholdType::Binary)
}

/// Binarize at the level chosen by Otsu's method.
#[must_use = "returns the binary image"]
pub fn otsu_threshold(image: &Raster) -> GrayImage {
    let gray = to_gray(image);
    let level = otsu_level(&gray);
    log::debug!("otsu level {level}");
    threshold(&gray, level, ThresholdType::Binary)
}

/// A pixel is white iff it exceeds its local mean minus [`ADAPTIVE_OFFSET`].
fn compare_to_local(gray: &GrayImage, local: &GrayImage) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let src = i16::from(gray.get_pixel(x, y).0[0]);
        let mean = i16::from(local.get_pixel(x, y).0[0]);
        if src > mean - ADAPTIVE_OFFSET {
            image::Luma([u8::MAX])
        } else {
            image::Luma([0])
        }
    })
}

/// Shared body of the adaptive thresholds: `smooth` produces the local mean.
fn adaptive(image: &Raster, smooth: fn(&Raster, KernelSize) -> Raster) -> GrayImage {
    let gray = to_gray(image);
    let local = to_gray(&smooth(&Raster::Gray(gray.clone()), ADAPTIVE_BLOCK));
    compare_to_local(&gray, &local)
}

/// Binarize against the unweighted mean of each [`ADAPTIVE_BLOCK`] neighborhood.
#[must_use = "returns the binary image"]
pub fn adaptive_mean_threshold(image: &Raster) -> GrayImage {
    adaptive(image, box_blur)
}

/// Binarize against the Gaussian-weighted mean of each
/// [`ADAPTIVE_BLOCK`] neighborhood.
#[must_use = "returns the binary image"]
pub fn adaptive_gaussian_threshold(image: &Raster) -> GrayImage {
    adaptive(image, gaussian_blur)
}
