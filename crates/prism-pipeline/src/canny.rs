//! Canny edge detection.
//!
//! Sobel gradients, non-maximum suppression, then hysteresis. The
//! gradient magnitude is the L1 norm `|gx| + |gy|`, so thresholds are on
//! the same scale as the common 100/200 defaults. No smoothing is
//! applied here; callers blur first if they want it.
//!
//! Hysteresis walks all 8 neighbours of each accepted pixel and checks
//! every neighbour against the image bounds before reading it. The
//! `imageproc 0.26` implementation skips two neighbours and can underflow
//! at the border (<https://github.com/image-rs/imageproc/issues/705>),
//! which is why this is not a thin wrapper over `imageproc::edges::canny`.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Offsets of the 8-connected neighbourhood.
const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Quantized gradient direction, in degrees from the +x axis (y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Horizontal,
    Diagonal45,
    Vertical,
    Diagonal135,
}

impl Direction {
    fn from_gradient(gx: f32, gy: f32) -> Self {
        let mut angle = gy.atan2(gx).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }
        if !(22.5..157.5).contains(&angle) {
            Self::Horizontal
        } else if angle < 67.5 {
            Self::Diagonal45
        } else if angle < 112.5 {
            Self::Vertical
        } else {
            Self::Diagonal135
        }
    }

    /// The two neighbours lying along the gradient.
    const fn across(self, x: u32, y: u32) -> [(u32, u32); 2] {
        match self {
            Self::Horizontal => [(x - 1, y), (x + 1, y)],
            Self::Diagonal45 => [(x - 1, y - 1), (x + 1, y + 1)],
            Self::Vertical => [(x, y - 1), (x, y + 1)],
            Self::Diagonal135 => [(x + 1, y - 1), (x - 1, y + 1)],
        }
    }
}

/// Row-major `f32` plane.
struct Plane {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Plane {
    fn filled(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn get(&self, x: u32, y: u32) -> f32 {
        self.data[self.index(x, y)]
    }

    fn set(&mut self, x: u32, y: u32, v: f32) {
        let i = self.index(x, y);
        self.data[i] = v;
    }
}

fn gradient_magnitude(gx: &Image<Luma<i16>>, gy: &Image<Luma<i16>>) -> Plane {
    let data = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(h, v)| f32::from(h.0[0].unsigned_abs()) + f32::from(v.0[0].unsigned_abs()))
        .collect();
    Plane {
        width: gx.width(),
        height: gx.height(),
        data,
    }
}

/// Keep only pixels that are local maxima along their gradient.
///
/// A pixel must strictly exceed its first neighbour along the gradient
/// and at least match the second, so a two-pixel plateau thins to one
/// pixel. The one-pixel border is always suppressed.
fn suppress_non_maxima(
    magnitude: &Plane,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Plane {
    let (w, h) = (magnitude.width, magnitude.height);
    let mut out = Plane::filled(w, h);
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let m = magnitude.get(x, y);
            if m <= 0.0 {
                continue;
            }
            let dir = Direction::from_gradient(
                f32::from(gx.get_pixel(x, y).0[0]),
                f32::from(gy.get_pixel(x, y).0[0]),
            );
            let [a, b] = dir.across(x, y);
            if m > magnitude.get(a.0, a.1) && m >= magnitude.get(b.0, b.1) {
                out.set(x, y, m);
            }
        }
    }
    out
}

/// Accept pixels at or above `high`, then grow through 8-connected
/// pixels at or above `low`.
fn hysteresis(thinned: &Plane, low: f32, high: f32) -> GrayImage {
    let (w, h) = (thinned.width, thinned.height);
    let mut out = GrayImage::new(w, h);
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if thinned.get(x, y) < high || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, Luma([u8::MAX]));
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                for (dx, dy) in NEIGHBOURS {
                    let (Some(nx), Some(ny)) = (cx.checked_add_signed(dx), cy.checked_add_signed(dy))
                    else {
                        continue;
                    };
                    if nx >= w || ny >= h {
                        continue;
                    }
                    if thinned.get(nx, ny) >= low && out.get_pixel(nx, ny).0[0] == 0 {
                        out.put_pixel(nx, ny, Luma([u8::MAX]));
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }
    out
}

/// Detect edges with hysteresis thresholds `low <= high`.
///
/// Returns a binary image: 255 for edge pixels, 0 elsewhere.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude = gradient_magnitude(&gx, &gy);
    let thinned = suppress_non_maxima(&magnitude, &gx, &gy);
    hysteresis(&thinned, low, high)
}
