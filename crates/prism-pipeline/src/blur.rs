//! Smoothing filters: box, Gaussian, and median.
//!
//! All three operate on each channel independently, so a color input
//! stays color and a grayscale input stays grayscale. Box and Gaussian
//! blur are separable and run through
//! [`imageproc::filter::separable_filter_equal`] on an `f32` copy of
//! each plane, rounding once at the end; borders are handled by
//! clamping to the nearest edge pixel.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::filter::separable_filter_equal;

use crate::kernel::KernelSize;
use crate::raster::Raster;

/// Normalized binomial taps used for the smallest Gaussian kernels.
const GAUSSIAN_TAPS_3: [f32; 3] = [0.25, 0.5, 0.25];
const GAUSSIAN_TAPS_5: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];
const GAUSSIAN_TAPS_7: [f32; 7] = [
    0.031_25, 0.109_375, 0.218_75, 0.281_25, 0.218_75, 0.109_375, 0.031_25,
];

/// Standard deviation implied by a kernel size when none is given.
#[must_use]
pub fn sigma_for(size: KernelSize) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let k = size.get() as f32;
    0.3f32.mul_add((k - 1.0).mul_add(0.5, -1.0), 0.8)
}

/// One-dimensional Gaussian taps for `size`, summing to 1.
#[must_use]
pub fn gaussian_taps(size: KernelSize) -> Vec<f32> {
    match size.get() {
        3 => GAUSSIAN_TAPS_3.to_vec(),
        5 => GAUSSIAN_TAPS_5.to_vec(),
        7 => GAUSSIAN_TAPS_7.to_vec(),
        _ => {
            let sigma = sigma_for(size);
            let scale = -0.5 / (sigma * sigma);
            #[allow(clippy::cast_precision_loss)]
            let center = size.radius() as f32;
            #[allow(clippy::cast_precision_loss)]
            let raw: Vec<f32> = (0..size.get())
                .map(|i| {
                    let d = i as f32 - center;
                    (scale * d * d).exp()
                })
                .collect();
            let sum: f32 = raw.iter().sum();
            raw.into_iter().map(|t| t / sum).collect()
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_byte(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Apply `taps` along both axes. Intermediate sums stay in `f32`.
fn smooth_plane(plane: &GrayImage, taps: &[f32]) -> GrayImage {
    let wide: Image<Luma<f32>> = ImageBuffer::from_fn(plane.width(), plane.height(), |x, y| {
        Luma([f32::from(plane.get_pixel(x, y).0[0])])
    });
    let smoothed = separable_filter_equal(&wide, taps);
    GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
        Luma([round_to_byte(smoothed.get_pixel(x, y).0[0])])
    })
}

/// Average over a `size x size` window.
#[must_use = "returns the blurred image"]
pub fn box_blur(image: &Raster, size: KernelSize) -> Raster {
    #[allow(clippy::cast_precision_loss)]
    let weight = 1.0 / size.get() as f32;
    let taps = vec![weight; size.get() as usize];
    image.map_planes(|plane| smooth_plane(plane, &taps))
}

/// Gaussian-weighted average over a `size x size` window.
///
/// The standard deviation is derived from `size` (see [`sigma_for`]).
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &Raster, size: KernelSize) -> Raster {
    let taps = gaussian_taps(size);
    image.map_planes(|plane| smooth_plane(plane, &taps))
}

/// Median over a `size x size` window.
///
/// Even sizes are rounded up to the next odd value first.
#[must_use = "returns the filtered image"]
pub fn median_blur(image: &Raster, size: KernelSize) -> Raster {
    let size = size.odd_ceil();
    let radius = size.radius();
    log::debug!("median blur with window {size}");
    image.map_planes(|plane| imageproc::filter::median_filter(plane, radius, radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Create a test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    fn gray(raster: Raster) -> GrayImage {
        match raster {
            Raster::Gray(img) => img,
            Raster::Rgb(_) => unreachable!("expected gray raster"),
        }
    }

    #[test]
    fn taps_sum_to_one() {
        for k in [3, 5, 7, 9, 15, 31] {
            let sum: f32 = gaussian_taps(KernelSize::fixed(k)).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "k={k}: taps sum to {sum}");
        }
    }

    #[test]
    fn taps_are_symmetric_and_peak_in_center() {
        let taps = gaussian_taps(KernelSize::fixed(11));
        assert_eq!(taps.len(), 11);
        for i in 0..5 {
            assert!((taps[i] - taps[10 - i]).abs() < 1e-6);
            assert!(taps[i] < taps[i + 1]);
        }
    }

    #[test]
    fn sigma_grows_with_kernel_size() {
        assert!((sigma_for(KernelSize::fixed(3)) - 0.8).abs() < 1e-6);
        assert!(sigma_for(KernelSize::fixed(9)) > sigma_for(KernelSize::fixed(5)));
    }

    #[test]
    fn box_blur_smooths_sharp_edge() {
        let blurred = gray(box_blur(&Raster::Gray(sharp_edge_image()), KernelSize::fixed(3)));
        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];
        assert!(left_of_edge > 0, "got {left_of_edge}");
        assert!(right_of_edge < 255, "got {right_of_edge}");
        // Far from the edge, values are untouched.
        assert_eq!(blurred.get_pixel(0, 5).0[0], 0);
    }

    #[test]
    fn gaussian_blur_smooths_sharp_edge() {
        let blurred = gray(gaussian_blur(
            &Raster::Gray(sharp_edge_image()),
            KernelSize::fixed(5),
        ));
        assert!(blurred.get_pixel(4, 5).0[0] > 0);
        assert!(blurred.get_pixel(5, 5).0[0] < 255);
    }

    #[test]
    fn uniform_image_unchanged_by_blur() {
        for v in 0..=u8::MAX {
            let img = Raster::Gray(GrayImage::from_pixel(16, 16, image::Luma([v])));
            for k in (3..=15).step_by(2) {
                let size = KernelSize::fixed(k);
                for (name, out) in [
                    ("box", box_blur(&img, size)),
                    ("gaussian", gaussian_blur(&img, size)),
                    ("median", median_blur(&img, size)),
                ] {
                    assert_eq!(out, img, "{name} k={k} changed flat value {v}");
                }
            }
        }
    }

    #[test]
    fn box_mean_rounds_to_nearest() {
        let mut img = GrayImage::new(7, 7);
        img.put_pixel(3, 3, image::Luma([8]));
        let out = gray(box_blur(&Raster::Gray(img), KernelSize::fixed(3)));
        // 8 / 9 rounds to 1.
        assert_eq!(out.get_pixel(3, 3).0[0], 1);
        assert_eq!(out.get_pixel(2, 2).0[0], 1);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn gaussian_center_weight_rounds_to_nearest() {
        let mut img = GrayImage::new(7, 7);
        img.put_pixel(3, 3, image::Luma([10]));
        let out = gray(gaussian_blur(&Raster::Gray(img), KernelSize::fixed(3)));
        // 10 * 0.5 * 0.5 = 2.5, 10 * 0.25 * 0.5 = 1.25, 10 * 0.25 * 0.25 = 0.625.
        assert_eq!(out.get_pixel(3, 3).0[0], 3);
        assert_eq!(out.get_pixel(2, 3).0[0], 1);
        assert_eq!(out.get_pixel(2, 2).0[0], 1);
    }

    #[test]
    fn color_blur_keeps_three_channels() {
        let img = Raster::Rgb(RgbImage::from_fn(12, 7, |x, _| {
            if x < 6 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        }));
        for out in [
            box_blur(&img, KernelSize::fixed(3)),
            gaussian_blur(&img, KernelSize::fixed(3)),
            median_blur(&img, KernelSize::fixed(3)),
        ] {
            assert_eq!(out.channels(), 3);
            assert_eq!(out.dimensions(), img.dimensions());
        }
    }

    #[test]
    fn median_removes_salt_noise() {
        let mut img = GrayImage::from_pixel(9, 9, image::Luma([10]));
        img.put_pixel(4, 4, image::Luma([255]));
        let filtered = gray(median_blur(&Raster::Gray(img), KernelSize::fixed(3)));
        assert_eq!(filtered.get_pixel(4, 4).0[0], 10);
    }

    #[test]
    fn median_even_size_matches_next_odd() {
        let img = Raster::Gray(GrayImage::from_fn(9, 9, |x, y| {
            image::Luma([u8::try_from((x * 31 + y * 17) % 256).unwrap_or(0)])
        }));
        assert_eq!(
            median_blur(&img, KernelSize::fixed(4)),
            median_blur(&img, KernelSize::fixed(5)),
        );
    }
}
