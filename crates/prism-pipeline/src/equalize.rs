//! Histogram equalization.
//!
//! [`equalize_luma`] equalizes brightness only: color input goes
//! through a YUV round trip where just the Y plane is touched, so hue
//! and saturation survive. [`equalize_and_stretch`] is the grayscale
//! preparation stage of the two-stage flow: equalize, then linearly
//! stretch whatever range remains onto the full 0..=255 scale.
//!
//! Equalization maps through the cumulative histogram with the count of
//! the darkest occupied level subtracted, so that level lands on 0 and
//! the brightest lands on 255.

use image::{GrayImage, RgbImage};
use imageproc::stats::histogram;

use crate::grayscale::{luma, to_gray};
use crate::raster::Raster;

/// Chroma channels are stored offset by half the 8-bit range.
const CHROMA_OFFSET: f32 = 128.0;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// BT.601 R,G,B -> (U, V), each offset by [`CHROMA_OFFSET`].
fn chroma(r: u8, g: u8, b: u8) -> (u8, u8) {
    let y = f32::from(luma(r, g, b));
    let u = (f32::from(b) - y).mul_add(0.492, CHROMA_OFFSET);
    let v = (f32::from(r) - y).mul_add(0.877, CHROMA_OFFSET);
    (saturate(u), saturate(v))
}

/// BT.601 Y,U,V -> R,G,B.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = f32::from(y);
    let u = f32::from(u) - CHROMA_OFFSET;
    let v = f32::from(v) - CHROMA_OFFSET;
    [
        saturate(v.mul_add(1.140, y)),
        saturate(v.mul_add(-0.581, u.mul_add(-0.395, y))),
        saturate(u.mul_add(2.032, y)),
    ]
}

/// `None` when fewer than two levels are occupied.
fn equalization_lut(plane: &GrayImage) -> Option<[u8; 256]> {
    let hist = histogram(plane);
    let counts = &hist.channels[0];
    let total: u64 = counts.iter().map(|&n| u64::from(n)).sum();
    let darkest = counts.iter().map(|&n| u64::from(n)).find(|&n| n > 0)?;
    let span = total - darkest;
    if span == 0 {
        return None;
    }

    let mut lut = [0u8; 256];
    let mut cdf = 0u64;
    for (entry, &count) in lut.iter_mut().zip(counts.iter()) {
        cdf += u64::from(count);
        let above = cdf.saturating_sub(darkest);
        *entry = u8::try_from((above * 255 + span / 2) / span).unwrap_or(u8::MAX);
    }
    Some(lut)
}

fn equalize_plane(plane: &GrayImage) -> GrayImage {
    let Some(lut) = equalization_lut(plane) else {
        return plane.clone();
    };
    let mut out = plane.clone();
    for p in out.pixels_mut() {
        p.0[0] = lut[usize::from(p.0[0])];
    }
    out
}

fn equalize_rgb(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut luma_plane = GrayImage::new(w, h);
    let mut chroma_planes = Vec::with_capacity((w as usize) * (h as usize));
    for (x, y, px) in image.enumerate_pixels() {
        let [r, g, b] = px.0;
        luma_plane.put_pixel(x, y, image::Luma([luma(r, g, b)]));
        chroma_planes.push(chroma(r, g, b));
    }

    let equalized = equalize_plane(&luma_plane);

    let mut out = RgbImage::new(w, h);
    for ((y_px, (u, v)), out_px) in equalized
        .pixels()
        .zip(chroma_planes)
        .zip(out.pixels_mut())
    {
        *out_px = image::Rgb(yuv_to_rgb(y_px.0[0], u, v));
    }
    out
}

/// Equalize the brightness histogram, leaving chroma untouched.
///
/// The channel count of the input is preserved.
#[must_use = "returns the equalized image"]
pub fn equalize_luma(image: &Raster) -> Raster {
    match image {
        Raster::Gray(img) => Raster::Gray(equalize_plane(img)),
        Raster::Rgb(img) => Raster::Rgb(equalize_rgb(img)),
    }
}

/// Map the occupied intensity range of `image` linearly onto 0..=255.
///
/// Images with a single intensity level are returned unchanged.
#[must_use = "returns the stretched image"]
pub fn stretch_contrast(image: &GrayImage) -> GrayImage {
    let (lo, hi) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if lo >= hi {
        return image.clone();
    }

    let span = u32::from(hi - lo);
    let mut out = image.clone();
    for p in out.pixels_mut() {
        let shifted = u32::from(p.0[0] - lo);
        let stretched = (shifted * 255 + span / 2) / span;
        p.0[0] = u8::try_from(stretched).unwrap_or(u8::MAX);
    }
    out
}

/// Grayscale, equalize, then stretch to the full range.
#[must_use = "returns the equalized image"]
pub fn equalize_and_stretch(image: &Raster) -> GrayImage {
    stretch_contrast(&equalize_plane(&to_gray(image)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grayscale::grayscale;

    /// A dim, low-contrast color gradient.
    fn dim_gradient() -> RgbImage {
        RgbImage::from_fn(32, 8, |x, _| {
            let base = u8::try_from(60 + x).unwrap_or(u8::MAX);
            image::Rgb([base + 20, base, base / 2])
        })
    }

    #[test]
    fn yuv_round_trip_is_close() {
        for rgb in [[12, 200, 99], [128, 128, 128], [200, 120, 40], [60, 80, 160]] {
            let [r, g, b] = rgb;
            let (u, v) = chroma(r, g, b);
            let back = yuv_to_rgb(luma(r, g, b), u, v);
            for c in 0..3 {
                let diff = i16::from(back[c]) - i16::from(rgb[c]);
                assert!(diff.abs() <= 3, "{rgb:?} round-tripped to {back:?}");
            }
        }
    }

    #[test]
    fn color_equalization_stays_color() {
        let out = equalize_luma(&Raster::Rgb(dim_gradient()));
        assert_eq!(out.channels(), 3);
        let Raster::Rgb(rgb) = &out else {
            unreachable!("expected rgb raster");
        };
        assert!(
            rgb.pixels().any(|p| p.0[0] != p.0[2]),
            "equalized output lost its color"
        );
        assert_ne!(out, grayscale(&Raster::Rgb(dim_gradient())));
    }

    #[test]
    fn color_equalization_spreads_brightness() {
        let src = dim_gradient();
        let Raster::Rgb(out) = equalize_luma(&Raster::Rgb(src.clone())) else {
            unreachable!("expected rgb raster");
        };
        let range = |img: &RgbImage| {
            let lumas: Vec<u8> = img.pixels().map(|p| luma(p.0[0], p.0[1], p.0[2])).collect();
            lumas.iter().max().copied().unwrap_or(0) - lumas.iter().min().copied().unwrap_or(0)
        };
        assert!(range(&out) > range(&src));
    }

    #[test]
    fn gray_equalization_stays_gray() {
        let img = GrayImage::from_fn(16, 16, |x, _| image::Luma([u8::try_from(100 + x).unwrap_or(0)]));
        let out = equalize_luma(&Raster::Gray(img));
        assert_eq!(out.channels(), 1);
    }

    fn two_level_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _| image::Luma([if x < 5 { 60 } else { 70 }]))
    }

    #[test]
    fn darkest_level_maps_to_zero() {
        let Raster::Gray(out) = equalize_luma(&Raster::Gray(two_level_image())) else {
            unreachable!("expected gray raster");
        };
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(9, 0).0[0], 255);
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn equalization_spaces_levels_by_cumulative_count() {
        // 4 pixels each at 10, 20, 30: the cdf is 4, 8, 12.
        let img = GrayImage::from_fn(12, 1, |x, _| {
            image::Luma([u8::try_from(10 * (x / 4 + 1)).unwrap_or(0)])
        });
        let out = equalize_plane(&img);
        let levels: Vec<u8> = [0, 4, 8].iter().map(|&x| out.get_pixel(x, 0).0[0]).collect();
        assert_eq!(levels, [0, 128, 255]);
    }

    #[test]
    fn single_level_is_left_alone() {
        let img = GrayImage::from_pixel(5, 5, image::Luma([42]));
        assert_eq!(equalize_plane(&img), img);
        assert_eq!(equalize_plane(&GrayImage::new(0, 0)), GrayImage::new(0, 0));
    }

    #[test]
    fn stretch_reaches_both_ends() {
        let img = GrayImage::from_fn(10, 1, |x, _| image::Luma([u8::try_from(100 + x).unwrap_or(0)]));
        let out = stretch_contrast(&img);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(9, 0).0[0], 255);
    }

    #[test]
    fn stretch_leaves_flat_image_alone() {
        let img = GrayImage::from_pixel(4, 4, image::Luma([77]));
        assert_eq!(stretch_contrast(&img), img);
    }

    #[test]
    fn equalize_and_stretch_is_single_channel_full_range() {
        let out = equalize_and_stretch(&Raster::Rgb(dim_gradient()));
        assert_eq!(out.dimensions(), (32, 8));
        let max = out.pixels().map(|p| p.0[0]).max().unwrap_or(0);
        let min = out.pixels().map(|p| p.0[0]).min().unwrap_or(255);
        assert_eq!((min, max), (0, 255));
    }
}
