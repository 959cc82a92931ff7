//! Flat on-disk storage for uploaded originals and derived artifacts.
//!
//! Originals and artifacts share one directory. Artifact names are
//! deterministic, so a second run on the same source replaces the
//! first artifact (last write wins).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::IoError;

/// A directory of stored images, addressed by bare file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// A store rooted at `root`. The directory is created lazily by
    /// [`ArtifactStore::ensure_root`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Fs`] if the directory cannot be created.
    pub fn ensure_root(&self) -> Result<(), IoError> {
        fs::create_dir_all(&self.root).map_err(|e| IoError::fs("create", &self.root, e))
    }

    /// Resolve `name` to a path directly under the root.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NotFound`] if `name` is empty, contains a path
    /// separator, or is `.` or `..`.
    pub fn path_of(&self, name: &str) -> Result<PathBuf, IoError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(IoError::NotFound(name.to_owned()));
        }
        Ok(self.root.join(name))
    }

    /// Store an uploaded original under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NotFound`] for names that escape the root and
    /// [`IoError::Fs`] if the write fails.
    pub fn save_original(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, IoError> {
        let path = self.path_of(name)?;
        fs::write(&path, bytes).map_err(|e| IoError::fs("write", &path, e))?;
        log::debug!("saved original {}", path.display());
        Ok(path)
    }

    /// Write an encoded artifact under `name`.
    ///
    /// The bytes go to a temporary file in the root first and are then
    /// renamed into place, so a reader never sees a partial artifact.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NotFound`] for names that escape the root and
    /// [`IoError::Fs`] if writing or renaming fails.
    pub fn write_artifact(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, IoError> {
        let path = self.path_of(name)?;
        let mut tmp =
            NamedTempFile::new_in(&self.root).map_err(|e| IoError::fs("create", &self.root, e))?;
        tmp.write_all(bytes)
            .map_err(|e| IoError::fs("write", tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| IoError::fs("rename", &path, e.error))?;
        log::info!("wrote artifact {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Read a stored file back by name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NotFound`] if the name is invalid or no such
    /// file exists, and [`IoError::Fs`] for any other read failure.
    pub fn open(&self, name: &str) -> Result<Vec<u8>, IoError> {
        let path = self.path_of(name)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IoError::NotFound(name.to_owned())
            } else {
                IoError::fs("read", &path, e)
            }
        })
    }
}
