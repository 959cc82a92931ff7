//! The request/response upload flow.
//!
//! An [`UploadHandler`] takes a file and its sibling form fields,
//! checks them, stores the original, runs one pipeline task and writes
//! the `processed_<name>` artifact next to the original.
//!
//! Checks happen before anything touches the disk: a rejected extension
//! or kernel size leaves the storage root untouched.

use std::path::PathBuf;

use prism_pipeline::{
    OutputArtifact, OutputFormat, PipelineError, Task, artifact_name, decode, dispatch, encode,
    validate_kernel_size,
};
use serde::{Deserialize, Serialize};

use crate::error::IoError;
use crate::store::ArtifactStore;

/// Extensions accepted for upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Whether `name` carries an allowed image extension.
#[must_use]
pub fn allowed_file(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
}

/// Reduce a client-supplied file name to a safe bare name.
///
/// Directory components are dropped, whitespace becomes `_`, and any
/// character other than an ASCII alphanumeric, `.`, `-` or `_` is
/// removed. Leading and trailing `.` and `_` are trimmed.
///
/// # Errors
///
/// Returns [`PipelineError::UnsupportedFile`] if nothing is left.
pub fn secure_filename(name: &str) -> Result<String, PipelineError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let trimmed = cleaned.trim_matches(['.', '_']);
    if trimmed.is_empty() {
        return Err(PipelineError::UnsupportedFile(name.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// One upload: the file plus its optional form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Client-supplied file name, sanitized before use.
    pub file_name: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Single-stage task code. Absent or unknown runs the identity task.
    pub task: Option<String>,
    /// Raw kernel size text. Absent or blank means the default.
    pub kernel_size: Option<String>,
}

/// What a successful upload produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// The sanitized name the original was stored under.
    pub original_name: String,
    /// `processed_<original_name>`.
    pub artifact_name: String,
    /// Where the artifact was written.
    pub artifact_path: PathBuf,
    /// Always `None` for now.
    pub histogram: Option<String>,
}

/// Handles uploads against one [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct UploadHandler {
    store: ArtifactStore,
}

impl UploadHandler {
    /// A handler writing into `store`.
    #[must_use]
    pub const fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// The store uploads are written to.
    #[must_use]
    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Process one upload end to end.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::UnsupportedFile`] if the name has no allowed
    ///   extension. Nothing is written.
    /// - [`PipelineError::InvalidParameter`] if the kernel size is
    ///   invalid for the task. Nothing is written.
    /// - [`PipelineError::ImageDecode`] / [`PipelineError::EmptyInput`]
    ///   if the bytes are not an image. The original is kept; no
    ///   artifact is written.
    /// - [`IoError::Fs`] on any filesystem failure.
    pub fn handle(&self, request: &UploadRequest) -> Result<UploadResponse, IoError> {
        if !allowed_file(&request.file_name) {
            log::warn!("rejected upload {:?}: extension not allowed", request.file_name);
            return Err(PipelineError::UnsupportedFile(request.file_name.clone()).into());
        }
        let original_name = secure_filename(&request.file_name)?;
        if !allowed_file(&original_name) {
            log::warn!(
                "rejected upload {:?}: sanitized name {original_name:?} lost its extension",
                request.file_name
            );
            return Err(PipelineError::UnsupportedFile(request.file_name.clone()).into());
        }

        let task = request.task.as_deref().map_or(Task::Identity, Task::from_code);
        let kernel_size = validate_kernel_size(request.kernel_size.as_deref(), task)
            .inspect_err(|e| log::warn!("rejected upload {original_name:?}: {e}"))?;
        if !task.uses_kernel() && request.kernel_size.is_some() {
            log::debug!("{task} ignores the kernel size");
        }

        self.store.ensure_root()?;
        self.store.save_original(&original_name, &request.bytes)?;

        let image = decode(&request.bytes)?;
        let artifact = OutputArtifact::new(dispatch(task, image, kernel_size));

        let name = artifact_name(&original_name);
        let encoded = encode(&artifact.image, OutputFormat::from_name(&name)?)?;
        let artifact_path = self.store.write_artifact(&name, &encoded)?;

        Ok(UploadResponse {
            original_name,
            artifact_name: name,
            artifact_path,
            histogram: artifact.histogram,
        })
    }
}
