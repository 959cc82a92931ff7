//! prism-io: Filesystem collaborators for the prism pipeline.
//!
//! Handles uploads (extension allow-list, storing originals, writing
//! `processed_<name>` artifacts), artifact retrieval, the interactive
//! two-stage shell, and the JSON storage config. All image work is
//! delegated to `prism-pipeline`.

pub mod config;
pub mod error;
pub mod shell;
pub mod store;
pub mod upload;

pub use config::{ConfigError, StorageConfig};
pub use error::IoError;
pub use shell::{Action, FileViewer, Flow, PRESETS, Session, Viewer};
pub use store::ArtifactStore;
pub use upload::{UploadHandler, UploadRequest, UploadResponse, allowed_file, secure_filename};
