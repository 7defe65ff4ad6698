//! Scoped temporary copies of revision content for external tools.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::repository::display_path;
use crate::{Error, Result};

/// Content of one file version written under its original file name inside
/// a private temporary directory, so tools can still detect the language
/// from the name. The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct StagedFile {
    dir: TempDir,
    path: PathBuf,
}

impl StagedFile {
    /// Write `content` to a fresh temporary file named like `original`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the directory or file cannot be created.
    pub fn write(original: &Path, content: &[u8]) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("sdt-")
            .tempdir()
            .map_err(|source| Error::Io {
                path: std::env::temp_dir().to_string_lossy().into_owned(),
                source,
            })?;
        let name = original
            .file_name()
            .map_or_else(|| "staged".into(), std::ffi::OsStr::to_os_string);
        let path = dir.path().join(name);
        std::fs::write(&path, content).map_err(|source| Error::Io {
            path: display_path(&path),
            source,
        })?;
        tracing::debug!(original = %original.display(), staged = %path.display(), "staged revision content");
        Ok(Self { dir, path })
    }

    /// Location of the staged copy.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the staged copy.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
