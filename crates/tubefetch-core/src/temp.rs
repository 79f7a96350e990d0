//! Scoped scratch files.
//!
//! Every path a job writes before the final output is held by a [`TempFile`]
//! from the moment the job decides to write it. The job calls
//! [`TempFile::cleanup`] on its way out to collect warnings; `Drop` removes
//! anything still armed if the job unwinds some other way.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Removal of a scratch file failed. Never fatal.
#[derive(Debug)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub error: io::Error,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "could not delete temporary file {}: {}",
            self.path.display(),
            self.error
        )
    }
}

/// A path that is deleted when the guard goes away, unless [`TempFile::keep`] was called.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard; the file stays on disk.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }

    /// Remove the file if it exists. A missing file is not an error.
    pub fn cleanup(mut self) -> Result<(), CleanupWarning> {
        self.armed = false;
        remove_if_exists(&self.path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(w) = remove_if_exists(&self.path) {
            tracing::warn!("{}", w);
        }
    }
}

/// Remove `path`; a missing file counts as removed.
pub(crate) fn remove_if_exists(path: &Path) -> Result<(), CleanupWarning> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed temporary file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(CleanupWarning {
            path: path.to_path_buf(),
            error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("video_temp.mp4");
        fs::write(&p, b"data").unwrap();
        {
            let _guard = TempFile::new(&p);
        }
        assert!(!p.exists());
    }

    #[test]
    fn cleanup_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let guard = TempFile::new(dir.path().join("never_written.m4a"));
        assert!(guard.cleanup().is_ok());
    }

    #[test]
    fn keep_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("final.mp4");
        fs::write(&p, b"data").unwrap();
        let kept = TempFile::new(&p).keep();
        assert_eq!(kept, p);
        assert!(p.exists());
    }

    #[test]
    fn cleanup_reports_directory_as_warning() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("not_a_file");
        fs::create_dir(&p).unwrap();
        let warning = TempFile::new(&p).cleanup().unwrap_err();
        assert_eq!(warning.path, p);
        assert!(warning.to_string().starts_with("could not delete temporary file"));
    }
}
