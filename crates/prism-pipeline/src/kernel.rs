//! Kernel-size parsing and validation.
//!
//! Kernel sizes arrive as optional free-form text (a form field or CLI
//! flag) and must be normalized into an odd integer greater than one
//! before any transformation runs.
//!
//! # Median exception
//!
//! Median blur tolerates even sizes: they pass validation unchanged and
//! the filter itself rounds them up to the next odd value (see
//! [`KernelSize::odd_ceil`]). Every other task rejects even sizes.

use std::fmt;
use std::num::{IntErrorKind, ParseIntError};

use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::types::PipelineError;

/// Side length of a square filter window.
///
/// Values constructed through [`validate_kernel_size`] are always > 1
/// and at most [`KernelSize::MAX`]. They are odd, except for even sizes
/// accepted on behalf of median blur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSize(u32);

impl KernelSize {
    /// Effective size when the caller supplies none.
    pub const DEFAULT: Self = Self(5);

    /// Largest accepted side length.
    ///
    /// Odd sizes above this are rejected even though they are otherwise
    /// well formed: the filters allocate and scan the full window.
    pub const MAX: u32 = 255;

    /// Wrap a known-valid odd size. Used for the fixed kernels of the
    /// two-stage flow.
    #[must_use]
    pub(crate) const fn fixed(size: u32) -> Self {
        Self(size)
    }

    /// The side length in pixels.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The next odd value at or above this size.
    #[must_use]
    pub const fn odd_ceil(self) -> Self {
        if self.0 % 2 == 0 {
            Self(self.0 + 1)
        } else {
            self
        }
    }

    /// Half-width of the window, excluding the center pixel.
    #[must_use]
    pub const fn radius(self) -> u32 {
        (self.0 - 1) / 2
    }
}

impl Default for KernelSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for KernelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a raw, possibly absent kernel size for `task`.
///
/// Absent, empty, or whitespace-only input yields [`KernelSize::DEFAULT`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] when the value is not an
/// integer, is not greater than one, exceeds [`KernelSize::MAX`], or is
/// even for any task other than [`Task::MedianBlur`]. Integers too large
/// for any machine type are reported as out of range, not as non-numeric.
pub fn validate_kernel_size(raw: Option<&str>, task: Task) -> Result<KernelSize, PipelineError> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(KernelSize::DEFAULT);
    };

    let value: i64 = text.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow => above_supported_maximum(text),
        IntErrorKind::NegOverflow => odd_and_greater_than_one(text),
        _ => PipelineError::InvalidParameter(format!("kernel size {text:?} is not a number")),
    })?;

    if value <= 1 {
        return Err(odd_and_greater_than_one(value));
    }
    if value > i64::from(KernelSize::MAX) {
        return Err(above_supported_maximum(value));
    }
    if value % 2 == 0 && task != Task::MedianBlur {
        return Err(odd_and_greater_than_one(value));
    }

    let size = u32::try_from(value).map_err(|_| odd_and_greater_than_one(value))?;
    Ok(KernelSize(size))
}

fn odd_and_greater_than_one(value: impl fmt::Display) -> PipelineError {
    PipelineError::InvalidParameter(format!(
        "kernel size {value} must be odd and greater than 1"
    ))
}

fn above_supported_maximum(value: impl fmt::Display) -> PipelineError {
    PipelineError::InvalidParameter(format!(
        "kernel size {value} exceeds the supported maximum of {}",
        KernelSize::MAX
    ))
}
