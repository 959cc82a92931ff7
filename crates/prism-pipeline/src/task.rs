//! Single-stage dispatch: one task code selects one transformation.
//!
//! This module defines the [`Transform`] trait shared by both flows and
//! the [`Task`] enum for the upload flow.
//!
//! # Total mapping
//!
//! Every task code maps to a variant. Codes without a transformation
//! map to [`Task::Identity`], which returns its input unchanged, so an
//! unknown code is never an error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blur::{box_blur, gaussian_blur, median_blur};
use crate::equalize::equalize_luma;
use crate::grayscale::grayscale;
use crate::kernel::KernelSize;
use crate::raster::Raster;

/// A transformation that consumes a raster and produces a new one.
///
/// Implementations never share state between calls.
pub trait Transform {
    /// Apply the transformation.
    fn apply(&self, image: Raster) -> Raster;
}

/// Selects which transformation the upload flow runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Task {
    /// Code 1: color to single-channel luma.
    Grayscale,
    /// Code 2: uniform `k x k` average.
    BoxBlur,
    /// Code 3: Gaussian `k x k` average.
    GaussianBlur,
    /// Code 4: `k x k` median; even `k` is rounded up.
    MedianBlur,
    /// Code 5: equalize brightness only, keep color.
    EqualizeHistogram,
    /// Any other code: input returned unchanged.
    #[default]
    Identity,
}

impl Task {
    /// Map a task code to its variant. Total: unknown codes are [`Task::Identity`].
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::Grayscale,
            "2" => Self::BoxBlur,
            "3" => Self::GaussianBlur,
            "4" => Self::MedianBlur,
            "5" => Self::EqualizeHistogram,
            _ => Self::Identity,
        }
    }

    /// The numeric code of this task, `None` for [`Task::Identity`].
    #[must_use]
    pub const fn code(self) -> Option<u8> {
        match self {
            Self::Grayscale => Some(1),
            Self::BoxBlur => Some(2),
            Self::GaussianBlur => Some(3),
            Self::MedianBlur => Some(4),
            Self::EqualizeHistogram => Some(5),
            Self::Identity => None,
        }
    }

    /// Whether the task reads the kernel size at all.
    #[must_use]
    pub const fn uses_kernel(self) -> bool {
        matches!(self, Self::BoxBlur | Self::GaussianBlur | Self::MedianBlur)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Grayscale => "grayscale",
            Self::BoxBlur => "box blur",
            Self::GaussianBlur => "gaussian blur",
            Self::MedianBlur => "median blur",
            Self::EqualizeHistogram => "histogram equalization",
            Self::Identity => "identity",
        };
        f.write_str(name)
    }
}

/// An immutable request for one single-stage transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// The transformation to run.
    pub task: Task,
    /// Window size, ignored by tasks without a kernel.
    pub kernel_size: KernelSize,
}

impl Transform for TaskDescriptor {
    fn apply(&self, image: Raster) -> Raster {
        let k = self.kernel_size;
        match self.task {
            Task::Grayscale => grayscale(&image),
            Task::BoxBlur => box_blur(&image, k),
            Task::GaussianBlur => gaussian_blur(&image, k),
            Task::MedianBlur => median_blur(&image, k),
            Task::EqualizeHistogram => equalize_luma(&image),
            Task::Identity => image,
        }
    }
}

/// Run exactly one transformation selected by `task`.
#[must_use = "returns the transformed image"]
pub fn dispatch(task: Task, image: Raster, kernel_size: KernelSize) -> Raster {
    log::debug!("dispatching {task} (kernel size {kernel_size})");
    TaskDescriptor { task, kernel_size }.apply(image)
}
