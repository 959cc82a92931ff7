//! Errors raised by the filesystem collaborators.

use std::path::{Path, PathBuf};

use prism_pipeline::PipelineError;

use crate::config::ConfigError;

/// Errors that can occur while handling uploads, artifacts or shell actions.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The pipeline rejected the input or failed to process it.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A filesystem operation failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Fs {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No artifact with this name exists under the storage root, or the
    /// name tries to escape it.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A shell line did not parse as an action.
    #[error("unrecognized action: {0}")]
    UnknownAction(String),

    /// A preset number outside the built-in table.
    #[error("no preset {0}")]
    UnknownPreset(usize),
}

impl IoError {
    pub(crate) fn fs(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Fs {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}
