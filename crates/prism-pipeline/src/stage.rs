//! Two-stage dispatch for the interactive flow.
//!
//! A [`StagePair`] names a preparation stage and a segmentation stage,
//! each chosen from its own code space. Stage 1 runs on a copy of the
//! input, stage 2 runs on whatever stage 1 produced. Either stage may be
//! [`None`](Preparation::None), in which case it passes its input
//! through. The stages never look at each other's codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blur::gaussian_blur;
use crate::edge::{CANNY_HIGH, CANNY_LOW, canny, laplacian};
use crate::equalize::equalize_and_stretch;
use crate::kernel::KernelSize;
use crate::raster::Raster;
use crate::task::Transform;
use crate::threshold::{
    adaptive_gaussian_threshold, adaptive_mean_threshold, global_threshold, otsu_threshold,
};

/// Kernel of the stage-2 low-pass blur.
pub const LOW_PASS_KERNEL: KernelSize = KernelSize::fixed(5);

/// Stage 1: contrast preparation or binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Preparation {
    /// Code 1: histogram equalization followed by a linear contrast stretch.
    EqualizeStretch,
    /// Code 6: binary threshold at a fixed cutoff.
    GlobalThreshold,
    /// Code 7: binary threshold at the Otsu level.
    OtsuThreshold,
    /// Code 11: adaptive threshold against the local mean.
    AdaptiveMean,
    /// Code 12: adaptive threshold against the local Gaussian mean.
    AdaptiveGaussian,
    /// Any other code.
    #[default]
    None,
}

impl Preparation {
    /// Map a stage-1 code to its variant. Unknown codes map to [`Preparation::None`].
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::EqualizeStretch,
            6 => Self::GlobalThreshold,
            7 => Self::OtsuThreshold,
            11 => Self::AdaptiveMean,
            12 => Self::AdaptiveGaussian,
            _ => Self::None,
        }
    }
}

impl Transform for Preparation {
    fn apply(&self, image: Raster) -> Raster {
        match self {
            Self::EqualizeStretch => Raster::Gray(equalize_and_stretch(&image)),
            Self::GlobalThreshold => Raster::Gray(global_threshold(&image)),
            Self::OtsuThreshold => Raster::Gray(otsu_threshold(&image)),
            Self::AdaptiveMean => Raster::Gray(adaptive_mean_threshold(&image)),
            Self::AdaptiveGaussian => Raster::Gray(adaptive_gaussian_threshold(&image)),
            Self::None => image,
        }
    }
}

/// Stage 2: smoothing or edge extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Segmentation {
    /// Code 2: Gaussian low-pass with [`LOW_PASS_KERNEL`].
    LowPass,
    /// Code 3: absolute Laplacian response.
    Laplacian,
    /// Code 4: Canny edges with fixed thresholds.
    Canny,
    /// Any other code.
    #[default]
    None,
}

impl Segmentation {
    /// Map a stage-2 code to its variant. Unknown codes map to [`Segmentation::None`].
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            2 => Self::LowPass,
            3 => Self::Laplacian,
            4 => Self::Canny,
            _ => Self::None,
        }
    }
}

impl Transform for Segmentation {
    fn apply(&self, image: Raster) -> Raster {
        match self {
            Self::LowPass => gaussian_blur(&image, LOW_PASS_KERNEL),
            Self::Laplacian => Raster::Gray(laplacian(&image)),
            Self::Canny => Raster::Gray(canny(&image, CANNY_LOW, CANNY_HIGH)),
            Self::None => image,
        }
    }
}

/// An immutable stage-1/stage-2 selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StagePair {
    /// Stage 1.
    pub preparation: Preparation,
    /// Stage 2, applied to the output of stage 1.
    pub segmentation: Segmentation,
}

impl StagePair {
    /// Resolve both stage codes.
    #[must_use]
    pub const fn from_codes(stage1: u32, stage2: u32) -> Self {
        Self {
            preparation: Preparation::from_code(stage1),
            segmentation: Segmentation::from_code(stage2),
        }
    }
}

impl fmt::Display for StagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.preparation, self.segmentation)
    }
}

impl Transform for StagePair {
    fn apply(&self, image: Raster) -> Raster {
        let prepared = self.preparation.apply(image);
        self.segmentation.apply(prepared)
    }
}

/// Apply `stages` to a copy of `image`. The input is left untouched.
#[must_use = "returns the transformed image"]
pub fn dispatch_stages(stages: &StagePair, image: &Raster) -> Raster {
    log::debug!("dispatching stages {stages}");
    stages.apply(image.clone())
}
