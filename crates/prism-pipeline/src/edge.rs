//! Edge responses: Laplacian magnitude and Canny.
//!
//! Both reduce their input to grayscale first and return a
//! single-channel image.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

use crate::grayscale::to_gray;
use crate::raster::Raster;

/// Low Canny hysteresis threshold used by the segmentation stage.
pub const CANNY_LOW: f32 = 100.0;
/// High Canny hysteresis threshold used by the segmentation stage.
pub const CANNY_HIGH: f32 = 200.0;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero accepts every pixel with any gradient at
/// all, which turns the output into noise.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Absolute 4-neighbour Laplacian response, saturated to 8 bits.
///
/// The second derivative is computed at 16-bit signed precision so
/// neither sign nor magnitude is lost before the absolute value is
/// taken.
#[must_use = "returns the edge magnitude image"]
pub fn laplacian(image: &Raster) -> GrayImage {
    let gray = to_gray(image);
    let response: Image<Luma<i16>> = filter_clamped(&gray, kernel::LAPLACIAN_3X3);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let magnitude = response.get_pixel(x, y).0[0].unsigned_abs();
        Luma([u8::try_from(magnitude).unwrap_or(u8::MAX)])
    })
}

/// Canny edge detection on the grayscale reduction of `image`.
///
/// Both thresholds are clamped to at least [`MIN_THRESHOLD`] and `low`
/// is clamped to at most `high`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &Raster, low: f32, high: f32) -> GrayImage {
    let high = high.max(MIN_THRESHOLD);
    let low = low.max(MIN_THRESHOLD).min(high);
    crate::canny::canny(&to_gray(image), low, high)
}
