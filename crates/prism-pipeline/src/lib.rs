//! prism-pipeline: Pure image transformation pipeline (sans-IO).
//!
//! Decodes raster images, validates task parameters, and runs either a
//! single transformation selected by a task code or a two-stage
//! preparation/segmentation pair:
//!
//! validate -> decode -> dispatch -> encode
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. All filesystem interaction
//! lives in `prism-io`.

pub mod artifact;
pub mod blur;
mod canny;
pub mod edge;
pub mod equalize;
pub mod grayscale;
pub mod kernel;
pub mod raster;
pub mod stage;
pub mod task;
pub mod threshold;
pub mod types;

pub use artifact::{OutputArtifact, OutputFormat, artifact_name, encode};
pub use kernel::{KernelSize, validate_kernel_size};
pub use raster::{Raster, decode};
pub use stage::{Preparation, Segmentation, StagePair, dispatch_stages};
pub use task::{Task, TaskDescriptor, Transform, dispatch};
pub use types::{Dimensions, PipelineError};

/// Run one single-stage task on encoded image bytes.
///
/// The kernel size is validated before the image is decoded, so an
/// invalid parameter never costs a decode.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `raw_kernel_size`
/// fails validation.
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
pub fn run_task(
    image_bytes: &[u8],
    task_code: Option<&str>,
    raw_kernel_size: Option<&str>,
) -> Result<OutputArtifact, PipelineError> {
    let task = task_code.map_or(Task::Identity, Task::from_code);
    let kernel_size = validate_kernel_size(raw_kernel_size, task)?;
    let image = decode(image_bytes)?;
    Ok(OutputArtifact::new(dispatch(task, image, kernel_size)))
}

/// Run a stage-1/stage-2 code pair on an already decoded image.
///
/// Unrecognized codes are no-ops for their stage.
#[must_use]
pub fn run_stages(image: &Raster, stage1: u32, stage2: u32) -> OutputArtifact {
    OutputArtifact::new(dispatch_stages(&StagePair::from_codes(stage1, stage2), image))
}
